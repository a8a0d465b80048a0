//! Database models

use serde::{Deserialize, Serialize};

/// Row of the `doctor`, `insurance` or `specialty` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct NamedEntity {
    pub id: i64,
    pub name: String,
}

pub type Doctor = NamedEntity;
pub type Insurance = NamedEntity;
pub type Specialty = NamedEntity;

/// A doctor-to-insurance or doctor-to-specialty relationship, by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct LinkPair {
    pub doctor: String,
    pub target: String,
}

/// One entry of the `/specialty/<name>` listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialtyDoctor {
    pub doctor: String,
    pub insurances: Vec<String>,
}
