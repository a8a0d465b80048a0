//! Database initialization
//!
//! Opens (or creates) the Entity Store and creates any missing tables.
//! There is no migration mechanism: tables are created if absent and
//! otherwise left untouched.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // WAL lets the public pages read while a management request writes
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;

    configure_connection(&pool).await?;
    create_tables(&pool).await?;

    Ok(pool)
}

/// Open a private in-memory Entity Store
///
/// Limited to one connection that is never recycled: every SQLite
/// in-memory connection is a separate database.
pub async fn open_in_memory() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    configure_connection(&pool).await?;
    create_tables(&pool).await?;

    Ok(pool)
}

async fn configure_connection(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(pool)
        .await?;

    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create all Entity Store tables (idempotent)
pub async fn create_tables(pool: &SqlitePool) -> Result<()> {
    create_named_table(pool, "doctor").await?;
    create_named_table(pool, "insurance").await?;
    create_named_table(pool, "specialty").await?;

    // Linking tables. Pair uniqueness is an application rule, not a constraint.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS doctor_insurance (
            id INTEGER PRIMARY KEY,
            doctor_id INTEGER NOT NULL REFERENCES doctor(id),
            insurance_id INTEGER NOT NULL REFERENCES insurance(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS doctor_specialty (
            id INTEGER PRIMARY KEY,
            doctor_id INTEGER NOT NULL REFERENCES doctor(id),
            specialty_id INTEGER NOT NULL REFERENCES specialty(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_doctor_insurance_pair ON doctor_insurance(doctor_id, insurance_id)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_doctor_specialty_pair ON doctor_specialty(doctor_id, specialty_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_named_table(pool: &SqlitePool, table: &str) -> Result<()> {
    let sql = format!(
        "CREATE TABLE IF NOT EXISTS {} (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE
        )",
        table
    );
    sqlx::query(&sql).execute(pool).await?;
    Ok(())
}
