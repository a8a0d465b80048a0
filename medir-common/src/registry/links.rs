//! Doctor relationship link/unlink and bulk insurance linking

use super::{find_id, validate_name, EntityKind, LinkKind, LinkOutcome, UnlinkOutcome};
use crate::Result;
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashSet;
use tracing::{debug, info};

/// Outcome of [`mass_link_insurance`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MassLinkReport {
    pub insurance_id: i64,
    /// The insurance did not exist and was created by this call
    pub insurance_created: bool,
    pub linked: Vec<String>,
    pub already_linked: Vec<String>,
    pub unknown_doctors: Vec<String>,
}

/// Create a doctor relationship unless the pair is already linked
pub async fn link(
    pool: &SqlitePool,
    kind: LinkKind,
    doctor_name: &str,
    target_name: &str,
) -> Result<LinkOutcome> {
    let mut tx = pool.begin().await?;

    let Some(doctor_id) = find_id(&mut *tx, EntityKind::Doctor, doctor_name).await? else {
        debug!("Link skipped, doctor '{}' not found", doctor_name);
        return Ok(LinkOutcome::DoctorNotFound);
    };
    let Some(target_id) = find_id(&mut *tx, kind.target(), target_name).await? else {
        debug!("Link skipped, {} '{}' not found", kind.target().table(), target_name);
        return Ok(LinkOutcome::TargetNotFound);
    };

    let inserted = insert_link_if_absent(&mut tx, kind, doctor_id, target_id).await?;
    tx.commit().await?;

    if inserted {
        info!("Linked '{}' to {} '{}'", doctor_name, kind.target().table(), target_name);
        Ok(LinkOutcome::Linked)
    } else {
        debug!("'{}' already linked to '{}'", doctor_name, target_name);
        Ok(LinkOutcome::AlreadyLinked)
    }
}

/// Remove a doctor relationship
///
/// Every row for the pair is removed, so duplicates left by older
/// versions of the store are cleaned up too.
pub async fn unlink(
    pool: &SqlitePool,
    kind: LinkKind,
    doctor_name: &str,
    target_name: &str,
) -> Result<UnlinkOutcome> {
    let mut tx = pool.begin().await?;

    let Some(doctor_id) = find_id(&mut *tx, EntityKind::Doctor, doctor_name).await? else {
        return Ok(UnlinkOutcome::DoctorNotFound);
    };
    let Some(target_id) = find_id(&mut *tx, kind.target(), target_name).await? else {
        return Ok(UnlinkOutcome::TargetNotFound);
    };

    let sql = format!(
        "DELETE FROM {} WHERE doctor_id = ? AND {} = ?",
        kind.table(),
        kind.target_column()
    );
    let removed = sqlx::query(&sql)
        .bind(doctor_id)
        .bind(target_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    tx.commit().await?;

    if removed == 0 {
        debug!("'{}' was not linked to '{}'", doctor_name, target_name);
        return Ok(UnlinkOutcome::NotLinked);
    }

    info!(
        "Unlinked '{}' from {} '{}' ({} row(s))",
        doctor_name,
        kind.target().table(),
        target_name,
        removed
    );
    Ok(UnlinkOutcome::Unlinked)
}

pub async fn link_doctor_insurance(
    pool: &SqlitePool,
    doctor_name: &str,
    insurance_name: &str,
) -> Result<LinkOutcome> {
    link(pool, LinkKind::Insurance, doctor_name, insurance_name).await
}

pub async fn unlink_doctor_insurance(
    pool: &SqlitePool,
    doctor_name: &str,
    insurance_name: &str,
) -> Result<UnlinkOutcome> {
    unlink(pool, LinkKind::Insurance, doctor_name, insurance_name).await
}

pub async fn link_doctor_specialty(
    pool: &SqlitePool,
    doctor_name: &str,
    specialty_name: &str,
) -> Result<LinkOutcome> {
    link(pool, LinkKind::Specialty, doctor_name, specialty_name).await
}

pub async fn unlink_doctor_specialty(
    pool: &SqlitePool,
    doctor_name: &str,
    specialty_name: &str,
) -> Result<UnlinkOutcome> {
    unlink(pool, LinkKind::Specialty, doctor_name, specialty_name).await
}

/// Link many doctors to one insurance, creating the insurance if absent
///
/// Unknown doctor names are skipped and reported. All inserts share one
/// transaction: either every new link (and the insurance) is stored, or none.
pub async fn mass_link_insurance<I, S>(
    pool: &SqlitePool,
    insurance_name: &str,
    doctor_names: I,
) -> Result<MassLinkReport>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    validate_name(EntityKind::Insurance, insurance_name)?;

    let mut tx = pool.begin().await?;
    let mut report = MassLinkReport::default();

    report.insurance_id = match find_id(&mut *tx, EntityKind::Insurance, insurance_name).await? {
        Some(id) => id,
        None => {
            report.insurance_created = true;
            sqlx::query("INSERT INTO insurance (name) VALUES (?)")
                .bind(insurance_name)
                .execute(&mut *tx)
                .await?
                .last_insert_rowid()
        }
    };

    let mut seen = HashSet::new();
    for doctor_name in doctor_names {
        let doctor_name = doctor_name.as_ref();
        if !seen.insert(doctor_name.to_string()) {
            continue;
        }

        let Some(doctor_id) = find_id(&mut *tx, EntityKind::Doctor, doctor_name).await? else {
            report.unknown_doctors.push(doctor_name.to_string());
            continue;
        };

        if insert_link_if_absent(&mut tx, LinkKind::Insurance, doctor_id, report.insurance_id).await? {
            report.linked.push(doctor_name.to_string());
        } else {
            report.already_linked.push(doctor_name.to_string());
        }
    }

    tx.commit().await?;

    info!(
        "Mass link to '{}': {} linked, {} already linked, {} unknown{}",
        insurance_name,
        report.linked.len(),
        report.already_linked.len(),
        report.unknown_doctors.len(),
        if report.insurance_created { " (insurance created)" } else { "" }
    );
    Ok(report)
}

/// Check-then-insert that keeps at most one row per pair
async fn insert_link_if_absent(
    conn: &mut SqliteConnection,
    kind: LinkKind,
    doctor_id: i64,
    target_id: i64,
) -> Result<bool> {
    let sql = format!(
        "SELECT id FROM {} WHERE doctor_id = ? AND {} = ? LIMIT 1",
        kind.table(),
        kind.target_column()
    );
    let existing: Option<i64> = sqlx::query_scalar(&sql)
        .bind(doctor_id)
        .bind(target_id)
        .fetch_optional(&mut *conn)
        .await?;
    if existing.is_some() {
        return Ok(false);
    }

    let sql = format!(
        "INSERT INTO {} (doctor_id, {}) VALUES (?, ?)",
        kind.table(),
        kind.target_column()
    );
    sqlx::query(&sql)
        .bind(doctor_id)
        .bind(target_id)
        .execute(&mut *conn)
        .await?;
    Ok(true)
}
