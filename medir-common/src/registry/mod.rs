//! Entity Store operations
//!
//! Create/delete for doctors, insurances and specialties, and link/unlink
//! for the two doctor relationships. Every public operation runs in a single
//! transaction: it commits as a unit or leaves the store unchanged.
//!
//! Name lookups are exact, case-sensitive matches. Names are never trimmed
//! or case-folded here.

mod entities;
mod links;
mod listing;

pub use entities::*;
pub use links::*;
pub use listing::*;

use crate::{Error, Result};
use serde::Serialize;
use sqlx::{Executor, Sqlite};

/// The three named entity tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Doctor,
    Insurance,
    Specialty,
}

impl EntityKind {
    pub fn table(self) -> &'static str {
        match self {
            EntityKind::Doctor => "doctor",
            EntityKind::Insurance => "insurance",
            EntityKind::Specialty => "specialty",
        }
    }

    /// Human-readable label
    pub fn label(self) -> &'static str {
        match self {
            EntityKind::Doctor => "Doctor",
            EntityKind::Insurance => "Insurance",
            EntityKind::Specialty => "Specialty",
        }
    }

    /// Join rows (table, column) that reference an entity of this kind
    fn dependent_links(self) -> &'static [(&'static str, &'static str)] {
        match self {
            EntityKind::Doctor => &[
                ("doctor_insurance", "doctor_id"),
                ("doctor_specialty", "doctor_id"),
            ],
            EntityKind::Insurance => &[("doctor_insurance", "insurance_id")],
            EntityKind::Specialty => &[("doctor_specialty", "specialty_id")],
        }
    }
}

/// The two doctor relationships
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    Insurance,
    Specialty,
}

impl LinkKind {
    pub fn table(self) -> &'static str {
        match self {
            LinkKind::Insurance => "doctor_insurance",
            LinkKind::Specialty => "doctor_specialty",
        }
    }

    fn target_column(self) -> &'static str {
        match self {
            LinkKind::Insurance => "insurance_id",
            LinkKind::Specialty => "specialty_id",
        }
    }

    /// Entity kind on the non-doctor side of the link
    pub fn target(self) -> EntityKind {
        match self {
            LinkKind::Insurance => EntityKind::Insurance,
            LinkKind::Specialty => EntityKind::Specialty,
        }
    }
}

/// Result of an add operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "id", rename_all = "snake_case")]
pub enum AddOutcome {
    Created(i64),
    AlreadyExists(i64),
}

impl AddOutcome {
    pub fn id(self) -> i64 {
        match self {
            AddOutcome::Created(id) | AddOutcome::AlreadyExists(id) => id,
        }
    }
}

/// Result of a delete operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeleteOutcome {
    /// Entity removed along with the join rows that referenced it
    Deleted { links_removed: u64 },
    NotFound,
}

/// Result of a link operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkOutcome {
    Linked,
    AlreadyLinked,
    DoctorNotFound,
    TargetNotFound,
}

/// Result of an unlink operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnlinkOutcome {
    Unlinked,
    NotLinked,
    DoctorNotFound,
    TargetNotFound,
}

/// Look up an entity id by exact name
pub(crate) async fn find_id<'e, E>(executor: E, kind: EntityKind, name: &str) -> Result<Option<i64>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT id FROM {} WHERE name = ? ORDER BY id LIMIT 1", kind.table());
    let id = sqlx::query_scalar::<_, i64>(&sql)
        .bind(name)
        .fetch_optional(executor)
        .await?;
    Ok(id)
}

/// Reject names that are empty or only whitespace
pub(crate) fn validate_name(kind: EntityKind, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::InvalidInput(format!(
            "{} name cannot be empty",
            kind.label()
        )));
    }
    Ok(())
}
