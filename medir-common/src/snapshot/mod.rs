//! Directory Snapshot: the denormalized doctor/specialty/insurance document
//! behind the public search pages
//!
//! The snapshot is a dataset of its own. It is written in full by an import
//! and afterwards only grows, through [`SnapshotStore::append_insurance`].
//! Nothing reconciles it with the Entity Store.

mod import;

pub use import::*;

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Separator between specialties in [`DirectoryRecord::specialty`]
pub const SPECIALTY_SEPARATOR: &str = ", ";

/// Whole snapshot document as stored on disk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryDocument {
    #[serde(default)]
    pub doctors_specialties: Vec<DirectoryRecord>,
}

/// One doctor entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryRecord {
    pub doctor: String,
    /// Comma-separated specialty list, kept verbatim
    pub specialty: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub insurances: Vec<String>,
}

impl DirectoryRecord {
    pub fn new(doctor: impl Into<String>, specialty: impl Into<String>) -> Self {
        Self {
            doctor: doctor.into(),
            specialty: specialty.into(),
            insurances: Vec::new(),
        }
    }

    /// Individual specialties, split on the literal `", "`
    pub fn specialties(&self) -> impl Iterator<Item = &str> {
        self.specialty.split(SPECIALTY_SEPARATOR)
    }
}

impl DirectoryDocument {
    pub fn from_records(records: Vec<DirectoryRecord>) -> Self {
        Self {
            doctors_specialties: records,
        }
    }

    /// Append an insurance to every record of the named doctor that lacks it
    ///
    /// Returns the number of records changed.
    pub fn append_insurance(&mut self, doctor_name: &str, insurance_name: &str) -> usize {
        let mut changed = 0;
        for record in self
            .doctors_specialties
            .iter_mut()
            .filter(|r| r.doctor == doctor_name)
        {
            if !record.insurances.iter().any(|i| i == insurance_name) {
                record.insurances.push(insurance_name.to_string());
                changed += 1;
            }
        }
        changed
    }

    /// (doctor, insurance) pairs in document order
    pub fn insurance_relationships(&self) -> Vec<(String, String)> {
        self.doctors_specialties
            .iter()
            .flat_map(|r| {
                r.insurances
                    .iter()
                    .map(move |i| (r.doctor.clone(), i.clone()))
            })
            .collect()
    }

    /// (doctor, specialty) pairs in document order, specialties split
    pub fn specialty_relationships(&self) -> Vec<(String, String)> {
        self.doctors_specialties
            .iter()
            .flat_map(|r| r.specialties().map(move |s| (r.doctor.clone(), s.to_string())))
            .collect()
    }
}

/// File-backed snapshot storage
///
/// Writes inside this process are serialized; separate processes writing the
/// same file are last-writer-wins.
#[derive(Debug)]
pub struct SnapshotStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the document, failing on missing or malformed files
    pub async fn try_load(&self) -> Result<DirectoryDocument> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let document = serde_json::from_str(&content)?;
        Ok(document)
    }

    /// Read the document, falling back to an empty one
    ///
    /// A missing file is expected before the first import. Any other
    /// failure is logged and also yields the empty document.
    pub async fn load(&self) -> DirectoryDocument {
        match self.try_load().await {
            Ok(document) => document,
            Err(Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Snapshot {} not found, using empty document", self.path.display());
                DirectoryDocument::default()
            }
            Err(e) => {
                warn!(
                    "Snapshot {} unreadable, using empty document: {}",
                    self.path.display(),
                    e
                );
                DirectoryDocument::default()
            }
        }
    }

    /// Overwrite the document
    pub async fn replace(&self, document: &DirectoryDocument) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.write(document).await
    }

    /// Append an insurance to the named doctor's records and persist
    ///
    /// Returns the number of records changed; the file is rewritten only
    /// when something changed.
    pub async fn append_insurance(&self, doctor_name: &str, insurance_name: &str) -> Result<usize> {
        if insurance_name.trim().is_empty() {
            return Err(Error::InvalidInput("Insurance name cannot be empty".to_string()));
        }

        let _guard = self.write_lock.lock().await;

        let mut document = self.load().await;
        let changed = document.append_insurance(doctor_name, insurance_name);
        if changed > 0 {
            self.write(&document).await?;
            info!(
                "Snapshot: added '{}' to {} record(s) of '{}'",
                insurance_name, changed, doctor_name
            );
        } else {
            debug!(
                "Snapshot: no record of '{}' missing '{}'",
                doctor_name, insurance_name
            );
        }
        Ok(changed)
    }

    /// Write through a sibling temporary file so readers never see a partial document
    async fn write(&self, document: &DirectoryDocument) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_string_pretty(document)?;
        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        tokio::fs::write(&tmp_path, json).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}
