//! Entity create/delete

use super::{find_id, validate_name, AddOutcome, DeleteOutcome, EntityKind};
use crate::{Error, Result};
use sqlx::SqlitePool;
use tracing::{debug, info};

/// Insert an entity unless one with the same name exists
///
/// A concurrent insert that wins the race surfaces as a storage UNIQUE
/// violation; that case is reported as `AlreadyExists` as well.
pub async fn add_entity(pool: &SqlitePool, kind: EntityKind, name: &str) -> Result<AddOutcome> {
    validate_name(kind, name)?;

    let mut tx = pool.begin().await?;

    if let Some(id) = find_id(&mut *tx, kind, name).await? {
        debug!("{} '{}' already exists (id {})", kind.label(), name, id);
        tx.rollback().await?;
        return Ok(AddOutcome::AlreadyExists(id));
    }

    let sql = format!("INSERT INTO {} (name) VALUES (?)", kind.table());
    let inserted = sqlx::query(&sql).bind(name).execute(&mut *tx).await;

    match inserted {
        Ok(result) => {
            tx.commit().await?;
            let id = result.last_insert_rowid();
            info!("Added {} '{}' (id {})", kind.table(), name, id);
            Ok(AddOutcome::Created(id))
        }
        Err(e) => {
            let err = Error::from(e);
            tx.rollback().await?;
            if !err.is_unique_violation() {
                return Err(err);
            }
            let id = find_id(pool, kind, name).await?.ok_or_else(|| {
                Error::Internal(format!(
                    "{} '{}' violated uniqueness but cannot be found",
                    kind.label(),
                    name
                ))
            })?;
            debug!("{} '{}' inserted concurrently (id {})", kind.label(), name, id);
            Ok(AddOutcome::AlreadyExists(id))
        }
    }
}

/// Delete an entity and every join row that references it
///
/// Join rows go first, then the entity row, all in one transaction.
/// A missing name is not an error.
pub async fn delete_entity(pool: &SqlitePool, kind: EntityKind, name: &str) -> Result<DeleteOutcome> {
    let mut tx = pool.begin().await?;

    let Some(id) = find_id(&mut *tx, kind, name).await? else {
        debug!("Delete skipped, {} '{}' not found", kind.table(), name);
        tx.rollback().await?;
        return Ok(DeleteOutcome::NotFound);
    };

    let mut links_removed = 0;
    for (table, column) in kind.dependent_links() {
        let sql = format!("DELETE FROM {} WHERE {} = ?", table, column);
        let result = sqlx::query(&sql).bind(id).execute(&mut *tx).await?;
        links_removed += result.rows_affected();
    }

    let sql = format!("DELETE FROM {} WHERE id = ?", kind.table());
    sqlx::query(&sql).bind(id).execute(&mut *tx).await?;

    tx.commit().await?;

    info!(
        "Deleted {} '{}' (id {}) and {} link(s)",
        kind.table(),
        name,
        id,
        links_removed
    );
    Ok(DeleteOutcome::Deleted { links_removed })
}

pub async fn add_doctor(pool: &SqlitePool, name: &str) -> Result<AddOutcome> {
    add_entity(pool, EntityKind::Doctor, name).await
}

pub async fn add_insurance(pool: &SqlitePool, name: &str) -> Result<AddOutcome> {
    add_entity(pool, EntityKind::Insurance, name).await
}

pub async fn add_specialty(pool: &SqlitePool, name: &str) -> Result<AddOutcome> {
    add_entity(pool, EntityKind::Specialty, name).await
}

pub async fn delete_doctor(pool: &SqlitePool, name: &str) -> Result<DeleteOutcome> {
    delete_entity(pool, EntityKind::Doctor, name).await
}

pub async fn delete_insurance(pool: &SqlitePool, name: &str) -> Result<DeleteOutcome> {
    delete_entity(pool, EntityKind::Insurance, name).await
}

pub async fn delete_specialty(pool: &SqlitePool, name: &str) -> Result<DeleteOutcome> {
    delete_entity(pool, EntityKind::Specialty, name).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    #[tokio::test]
    async fn test_add_then_duplicate() {
        let pool = open_in_memory().await.unwrap();

        let first = add_doctor(&pool, "Dr. A").await.unwrap();
        let second = add_doctor(&pool, "Dr. A").await.unwrap();

        assert!(matches!(first, AddOutcome::Created(_)));
        assert_eq!(second, AddOutcome::AlreadyExists(first.id()));
    }

    #[tokio::test]
    async fn test_names_are_case_sensitive() {
        let pool = open_in_memory().await.unwrap();

        let upper = add_insurance(&pool, "Acme").await.unwrap();
        let lower = add_insurance(&pool, "acme").await.unwrap();

        assert!(matches!(lower, AddOutcome::Created(_)));
        assert_ne!(upper.id(), lower.id());
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let pool = open_in_memory().await.unwrap();

        let result = add_specialty(&pool, "   ").await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_delete_missing_is_noop() {
        let pool = open_in_memory().await.unwrap();

        let outcome = delete_insurance(&pool, "Nobody Health").await.unwrap();
        assert_eq!(outcome, DeleteOutcome::NotFound);
    }
}
