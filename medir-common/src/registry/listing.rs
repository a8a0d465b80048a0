//! Read-only Entity Store queries

use super::{EntityKind, LinkKind};
use crate::db::{LinkPair, NamedEntity, SpecialtyDoctor};
use crate::Result;
use sqlx::SqlitePool;

/// All entities of one kind, ordered by name
pub async fn list_entities(pool: &SqlitePool, kind: EntityKind) -> Result<Vec<NamedEntity>> {
    let sql = format!("SELECT id, name FROM {} ORDER BY name", kind.table());
    let rows = sqlx::query_as::<_, NamedEntity>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn list_doctors(pool: &SqlitePool) -> Result<Vec<NamedEntity>> {
    list_entities(pool, EntityKind::Doctor).await
}

pub async fn list_insurances(pool: &SqlitePool) -> Result<Vec<NamedEntity>> {
    list_entities(pool, EntityKind::Insurance).await
}

pub async fn list_specialties(pool: &SqlitePool) -> Result<Vec<NamedEntity>> {
    list_entities(pool, EntityKind::Specialty).await
}

/// Distinct (doctor, target) name pairs for one relationship
///
/// Duplicate join rows collapse into one pair.
pub async fn list_links(pool: &SqlitePool, kind: LinkKind) -> Result<Vec<LinkPair>> {
    let sql = format!(
        "SELECT DISTINCT d.name AS doctor, t.name AS target
         FROM {link} l
         JOIN doctor d ON d.id = l.doctor_id
         JOIN {target} t ON t.id = l.{column}
         ORDER BY d.name, t.name",
        link = kind.table(),
        target = kind.target().table(),
        column = kind.target_column(),
    );
    let rows = sqlx::query_as::<_, LinkPair>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

/// Number of join rows, duplicates included
pub async fn count_link_rows(pool: &SqlitePool, kind: LinkKind) -> Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM {}", kind.table());
    let count = sqlx::query_scalar::<_, i64>(&sql).fetch_one(pool).await?;
    Ok(count)
}

/// Doctors practicing a specialty, each with the insurances they accept
///
/// Doctors appear in the order they were first linked to the specialty.
/// An unknown specialty yields an empty list.
pub async fn specialty_directory(pool: &SqlitePool, specialty_name: &str) -> Result<Vec<SpecialtyDoctor>> {
    let doctors: Vec<(i64, String)> = sqlx::query_as(
        r#"
        SELECT d.id, d.name
        FROM doctor_specialty ds
        JOIN doctor d ON d.id = ds.doctor_id
        JOIN specialty s ON s.id = ds.specialty_id
        WHERE s.name = ?
        GROUP BY d.id, d.name
        ORDER BY MIN(ds.id)
        "#,
    )
    .bind(specialty_name)
    .fetch_all(pool)
    .await?;

    let mut directory = Vec::with_capacity(doctors.len());
    for (doctor_id, doctor) in doctors {
        let insurances: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT i.name
            FROM doctor_insurance di
            JOIN insurance i ON i.id = di.insurance_id
            WHERE di.doctor_id = ?
            GROUP BY i.id, i.name
            ORDER BY MIN(di.id)
            "#,
        )
        .bind(doctor_id)
        .fetch_all(pool)
        .await?;

        directory.push(SpecialtyDoctor { doctor, insurances });
    }

    Ok(directory)
}
