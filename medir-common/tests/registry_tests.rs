//! Integration tests for the Entity Store
//!
//! Tests cover:
//! - Cascade completeness on delete
//! - At-most-one link per (doctor, insurance) and (doctor, specialty) pair
//! - Unlink of an unlinked pair is a no-op
//! - Bulk insurance linking with unknown doctors
//! - Specialty directory listing

use medir_common::db::init::init_database;
use medir_common::registry::{self, AddOutcome, DeleteOutcome, LinkKind, LinkOutcome, UnlinkOutcome};
use sqlx::SqlitePool;
use tempfile::TempDir;

/// Test helper: fresh file-backed database in a temporary directory
async fn setup_test_db() -> (TempDir, SqlitePool) {
    let dir = tempfile::tempdir().expect("Should create temp dir");
    let pool = init_database(&dir.path().join("medical.db"))
        .await
        .expect("Should initialize database");
    (dir, pool)
}

async fn rows_for_doctor_id(pool: &SqlitePool, table: &str, doctor_id: i64) -> i64 {
    let sql = format!("SELECT COUNT(*) FROM {} WHERE doctor_id = ?", table);
    sqlx::query_scalar(&sql)
        .bind(doctor_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_delete_doctor_cascades_links() {
    let (_dir, pool) = setup_test_db().await;

    let smith = registry::add_doctor(&pool, "Smith").await.unwrap().id();
    registry::add_insurance(&pool, "Acme Health").await.unwrap();
    registry::add_specialty(&pool, "Cardiology").await.unwrap();
    registry::link_doctor_insurance(&pool, "Smith", "Acme Health").await.unwrap();
    registry::link_doctor_specialty(&pool, "Smith", "Cardiology").await.unwrap();

    let outcome = registry::delete_doctor(&pool, "Smith").await.unwrap();

    assert_eq!(outcome, DeleteOutcome::Deleted { links_removed: 2 });
    assert_eq!(rows_for_doctor_id(&pool, "doctor_insurance", smith).await, 0);
    assert_eq!(rows_for_doctor_id(&pool, "doctor_specialty", smith).await, 0);
    assert!(registry::list_doctors(&pool).await.unwrap().is_empty());

    // The other side of each link survives
    assert_eq!(registry::list_insurances(&pool).await.unwrap().len(), 1);
    assert_eq!(registry::list_specialties(&pool).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_add_then_delete_leaves_no_rows() {
    let (_dir, pool) = setup_test_db().await;

    let smith = registry::add_doctor(&pool, "Smith").await.unwrap().id();
    let outcome = registry::delete_doctor(&pool, "Smith").await.unwrap();

    assert_eq!(outcome, DeleteOutcome::Deleted { links_removed: 0 });
    assert_eq!(rows_for_doctor_id(&pool, "doctor_insurance", smith).await, 0);
    assert_eq!(rows_for_doctor_id(&pool, "doctor_specialty", smith).await, 0);
}

#[tokio::test]
async fn test_delete_insurance_and_specialty_cascade() {
    let (_dir, pool) = setup_test_db().await;

    registry::add_doctor(&pool, "Dr. A").await.unwrap();
    registry::add_doctor(&pool, "Dr. B").await.unwrap();
    registry::add_insurance(&pool, "Acme").await.unwrap();
    registry::add_specialty(&pool, "Urology").await.unwrap();
    registry::mass_link_insurance(&pool, "Acme", ["Dr. A", "Dr. B"]).await.unwrap();
    registry::link_doctor_specialty(&pool, "Dr. A", "Urology").await.unwrap();

    assert_eq!(
        registry::delete_insurance(&pool, "Acme").await.unwrap(),
        DeleteOutcome::Deleted { links_removed: 2 }
    );
    assert_eq!(
        registry::delete_specialty(&pool, "Urology").await.unwrap(),
        DeleteOutcome::Deleted { links_removed: 1 }
    );
    assert_eq!(registry::count_link_rows(&pool, LinkKind::Insurance).await.unwrap(), 0);
    assert_eq!(registry::count_link_rows(&pool, LinkKind::Specialty).await.unwrap(), 0);
    assert_eq!(registry::list_doctors(&pool).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_link_insurance_twice_single_row() {
    let (_dir, pool) = setup_test_db().await;

    registry::add_doctor(&pool, "Dr. A").await.unwrap();
    registry::add_insurance(&pool, "Acme Health").await.unwrap();

    let first = registry::link_doctor_insurance(&pool, "Dr. A", "Acme Health").await.unwrap();
    assert_eq!(first, LinkOutcome::Linked);
    assert_eq!(registry::count_link_rows(&pool, LinkKind::Insurance).await.unwrap(), 1);

    let second = registry::link_doctor_insurance(&pool, "Dr. A", "Acme Health").await.unwrap();
    assert_eq!(second, LinkOutcome::AlreadyLinked);
    assert_eq!(registry::count_link_rows(&pool, LinkKind::Insurance).await.unwrap(), 1);
}

#[tokio::test]
async fn test_link_specialty_twice_single_row() {
    let (_dir, pool) = setup_test_db().await;

    registry::add_doctor(&pool, "Dr. A").await.unwrap();
    registry::add_specialty(&pool, "Cardiology").await.unwrap();

    registry::link_doctor_specialty(&pool, "Dr. A", "Cardiology").await.unwrap();
    let second = registry::link_doctor_specialty(&pool, "Dr. A", "Cardiology").await.unwrap();

    assert_eq!(second, LinkOutcome::AlreadyLinked);
    assert_eq!(registry::count_link_rows(&pool, LinkKind::Specialty).await.unwrap(), 1);
}

#[tokio::test]
async fn test_link_missing_names_noop() {
    let (_dir, pool) = setup_test_db().await;

    registry::add_doctor(&pool, "Dr. A").await.unwrap();
    registry::add_insurance(&pool, "Acme").await.unwrap();

    assert_eq!(
        registry::link_doctor_insurance(&pool, "Dr. Z", "Acme").await.unwrap(),
        LinkOutcome::DoctorNotFound
    );
    assert_eq!(
        registry::link_doctor_insurance(&pool, "Dr. A", "acme").await.unwrap(),
        LinkOutcome::TargetNotFound
    );
    assert_eq!(registry::count_link_rows(&pool, LinkKind::Insurance).await.unwrap(), 0);
}

#[tokio::test]
async fn test_unlink_never_linked_noop() {
    let (_dir, pool) = setup_test_db().await;

    registry::add_doctor(&pool, "Dr. A").await.unwrap();
    registry::add_doctor(&pool, "Dr. B").await.unwrap();
    registry::add_insurance(&pool, "Acme").await.unwrap();
    registry::link_doctor_insurance(&pool, "Dr. B", "Acme").await.unwrap();

    let outcome = registry::unlink_doctor_insurance(&pool, "Dr. A", "Acme").await.unwrap();

    assert_eq!(outcome, UnlinkOutcome::NotLinked);
    assert_eq!(registry::count_link_rows(&pool, LinkKind::Insurance).await.unwrap(), 1);
}

#[tokio::test]
async fn test_unlink_removes_pair() {
    let (_dir, pool) = setup_test_db().await;

    registry::add_doctor(&pool, "Dr. A").await.unwrap();
    registry::add_specialty(&pool, "Urology").await.unwrap();
    registry::link_doctor_specialty(&pool, "Dr. A", "Urology").await.unwrap();

    assert_eq!(
        registry::unlink_doctor_specialty(&pool, "Dr. A", "Urology").await.unwrap(),
        UnlinkOutcome::Unlinked
    );
    assert_eq!(
        registry::unlink_doctor_specialty(&pool, "Dr. A", "Urology").await.unwrap(),
        UnlinkOutcome::NotLinked
    );
    assert_eq!(
        registry::unlink_doctor_specialty(&pool, "Dr. A", "Oncology").await.unwrap(),
        UnlinkOutcome::TargetNotFound
    );
}

#[tokio::test]
async fn test_unlink_clears_legacy_duplicates() {
    let (_dir, pool) = setup_test_db().await;

    let doctor = registry::add_doctor(&pool, "Dr. A").await.unwrap().id();
    let specialty = registry::add_specialty(&pool, "Urology").await.unwrap().id();
    for _ in 0..2 {
        sqlx::query("INSERT INTO doctor_specialty (doctor_id, specialty_id) VALUES (?, ?)")
            .bind(doctor)
            .bind(specialty)
            .execute(&pool)
            .await
            .unwrap();
    }

    // Readers tolerate the duplicate rows
    assert_eq!(registry::list_links(&pool, LinkKind::Specialty).await.unwrap().len(), 1);

    registry::unlink_doctor_specialty(&pool, "Dr. A", "Urology").await.unwrap();
    assert_eq!(registry::count_link_rows(&pool, LinkKind::Specialty).await.unwrap(), 0);
}

#[tokio::test]
async fn test_mass_link_skips_unknown_doctors() {
    let (_dir, pool) = setup_test_db().await;

    registry::add_doctor(&pool, "Dr. A").await.unwrap();
    registry::add_doctor(&pool, "Dr. B").await.unwrap();

    let report = registry::mass_link_insurance(&pool, "Acme", ["Dr. A", "Dr. B", "Unknown Doc"])
        .await
        .unwrap();

    assert!(report.insurance_created);
    assert_eq!(report.linked, vec!["Dr. A", "Dr. B"]);
    assert_eq!(report.unknown_doctors, vec!["Unknown Doc"]);
    assert!(report.already_linked.is_empty());
    assert_eq!(registry::count_link_rows(&pool, LinkKind::Insurance).await.unwrap(), 2);
}

#[tokio::test]
async fn test_mass_link_counts_only_new_links() {
    let (_dir, pool) = setup_test_db().await;

    registry::add_doctor(&pool, "Dr. A").await.unwrap();
    registry::add_doctor(&pool, "Dr. B").await.unwrap();
    let acme = registry::add_insurance(&pool, "Acme").await.unwrap().id();
    registry::link_doctor_insurance(&pool, "Dr. A", "Acme").await.unwrap();

    let report = registry::mass_link_insurance(&pool, "Acme", ["Dr. A", "Dr. B", "Dr. B"])
        .await
        .unwrap();

    assert!(!report.insurance_created);
    assert_eq!(report.insurance_id, acme);
    assert_eq!(report.linked, vec!["Dr. B"]);
    assert_eq!(report.already_linked, vec!["Dr. A"]);
    assert_eq!(registry::count_link_rows(&pool, LinkKind::Insurance).await.unwrap(), 2);
}

#[tokio::test]
async fn test_add_duplicate_reports_existing() {
    let (_dir, pool) = setup_test_db().await;

    let created = registry::add_specialty(&pool, "Urology").await.unwrap();
    let again = registry::add_specialty(&pool, "Urology").await.unwrap();

    assert_eq!(again, AddOutcome::AlreadyExists(created.id()));
    assert_eq!(registry::list_specialties(&pool).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_specialty_directory() {
    let (_dir, pool) = setup_test_db().await;

    for doctor in ["Dr. B", "Dr. A", "Dr. C"] {
        registry::add_doctor(&pool, doctor).await.unwrap();
    }
    registry::add_specialty(&pool, "Pediatrics").await.unwrap();
    registry::add_insurance(&pool, "Acme").await.unwrap();
    registry::add_insurance(&pool, "Blue Shield").await.unwrap();

    registry::link_doctor_specialty(&pool, "Dr. B", "Pediatrics").await.unwrap();
    registry::link_doctor_specialty(&pool, "Dr. A", "Pediatrics").await.unwrap();
    registry::link_doctor_insurance(&pool, "Dr. A", "Blue Shield").await.unwrap();
    registry::link_doctor_insurance(&pool, "Dr. A", "Acme").await.unwrap();

    let directory = registry::specialty_directory(&pool, "Pediatrics").await.unwrap();

    assert_eq!(directory.len(), 2);
    assert_eq!(directory[0].doctor, "Dr. B");
    assert!(directory[0].insurances.is_empty());
    assert_eq!(directory[1].doctor, "Dr. A");
    assert_eq!(directory[1].insurances, vec!["Blue Shield", "Acme"]);

    assert!(registry::specialty_directory(&pool, "Oncology").await.unwrap().is_empty());
}
