//! Query Service: read-only search over the Directory Snapshot

use crate::snapshot::{DirectoryDocument, DirectoryRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Which field a search matches against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchKind {
    Insurance,
    Doctor,
    Specialty,
}

/// Search form parameters (`insurance_query`, `doctor_query`, `specialty_query`)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub insurance_query: Option<String>,
    #[serde(default)]
    pub doctor_query: Option<String>,
    #[serde(default)]
    pub specialty_query: Option<String>,
}

impl SearchQuery {
    /// The single query to run: the first non-empty of insurance, doctor, specialty
    pub fn resolve(&self) -> Option<(SearchKind, &str)> {
        [
            (SearchKind::Insurance, &self.insurance_query),
            (SearchKind::Doctor, &self.doctor_query),
            (SearchKind::Specialty, &self.specialty_query),
        ]
        .into_iter()
        .find_map(|(kind, value)| match value.as_deref() {
            Some(v) if !v.is_empty() => Some((kind, v)),
            _ => None,
        })
    }
}

/// One search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchingDoctor {
    pub name: String,
    /// Raw comma-joined specialty string
    pub specialties: String,
    /// Insurances joined with ", "
    pub insurances: String,
    /// Card color hues from the character lengths of the first two specialties
    pub hues: (u32, u32),
}

impl MatchingDoctor {
    fn from_record(record: &DirectoryRecord) -> Self {
        let mut lengths = record.specialties().map(|s| s.chars().count());
        let first = lengths.next().unwrap_or(0);
        let second = lengths.next().unwrap_or(first);

        Self {
            name: record.doctor.clone(),
            specialties: record.specialty.clone(),
            insurances: record.insurances.join(", "),
            hues: (hue(first), hue(second)),
        }
    }
}

fn hue(length: usize) -> u32 {
    ((length * 37) % 360) as u32
}

fn matches(record: &DirectoryRecord, kind: SearchKind, value: &str) -> bool {
    match kind {
        SearchKind::Insurance => record.insurances.iter().any(|i| i == value),
        SearchKind::Doctor => record.doctor == value,
        SearchKind::Specialty => record.specialties().any(|s| s == value),
    }
}

/// Records matching one query, in document order
pub fn search(document: &DirectoryDocument, kind: SearchKind, value: &str) -> Vec<MatchingDoctor> {
    document
        .doctors_specialties
        .iter()
        .filter(|record| matches(record, kind, value))
        .map(MatchingDoctor::from_record)
        .collect()
}

/// Run whichever query the form carries; no query means no results
pub fn run_query(document: &DirectoryDocument, query: &SearchQuery) -> Vec<MatchingDoctor> {
    match query.resolve() {
        Some((kind, value)) => search(document, kind, value),
        None => Vec::new(),
    }
}

/// Distinct doctor names, sorted
pub fn doctor_names(document: &DirectoryDocument) -> Vec<String> {
    document
        .doctors_specialties
        .iter()
        .map(|r| r.doctor.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Distinct insurance names, sorted
pub fn insurance_names(document: &DirectoryDocument) -> Vec<String> {
    document
        .doctors_specialties
        .iter()
        .flat_map(|r| r.insurances.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Distinct specialty names after splitting, sorted
pub fn specialty_names(document: &DirectoryDocument) -> Vec<String> {
    document
        .doctors_specialties
        .iter()
        .flat_map(|r| r.specialties().map(str::to_string))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
