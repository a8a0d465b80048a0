//! Snapshot import from a two-column practice roster
//!
//! The roster is plain text, one paragraph per line:
//!
//! ```text
//! Practice roster
//! Doctors:
//! Dr. A
//! Dr. B
//! Specialties:
//! Cardiology, Pediatrics
//! Urology
//! ```
//!
//! Nothing before the `Doctors:` header is read. Lines after it fill the
//! doctor column until `Specialties:` switches to the specialty column.
//! Other lines containing `:` are headers and are skipped.

use super::{DirectoryDocument, DirectoryRecord, SnapshotStore};
use crate::Result;
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

/// Doctor and specialty columns read from a roster
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterColumns {
    pub doctors: Vec<String>,
    pub specialties: Vec<String>,
}

/// Summary of one import run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub records: usize,
    /// Entries of the longer column that had no partner
    pub dropped: Vec<String>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Column {
    Preamble,
    Doctors,
    Specialties,
}

/// Split roster text into its two columns
pub fn parse_roster(text: &str) -> RosterColumns {
    let mut columns = RosterColumns::default();
    let mut current = Column::Preamble;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let lower = line.to_lowercase();
        if lower.starts_with("doctors:") {
            current = Column::Doctors;
            continue;
        }
        if current == Column::Preamble {
            continue;
        }
        if lower.starts_with("specialties:") {
            current = Column::Specialties;
            continue;
        }
        if line.contains(':') {
            continue;
        }

        match current {
            Column::Doctors => columns.doctors.push(line.to_string()),
            Column::Specialties => columns.specialties.push(line.to_string()),
            Column::Preamble => {}
        }
    }

    columns
}

/// Pair doctors with specialties by position, up to the shorter column
pub fn pair_columns(columns: RosterColumns) -> (Vec<DirectoryRecord>, Vec<String>) {
    let paired = columns.doctors.len().min(columns.specialties.len());

    let dropped: Vec<String> = columns
        .doctors
        .iter()
        .skip(paired)
        .chain(columns.specialties.iter().skip(paired))
        .cloned()
        .collect();

    let records = columns
        .doctors
        .into_iter()
        .zip(columns.specialties)
        .map(|(doctor, specialty)| DirectoryRecord::new(doctor, specialty))
        .collect();

    (records, dropped)
}

/// Replace the snapshot with the roster's doctor/specialty pairs
pub async fn import_roster(store: &SnapshotStore, text: &str) -> Result<ImportSummary> {
    let (records, dropped) = pair_columns(parse_roster(text));

    if !dropped.is_empty() {
        warn!("Roster columns differ in length, dropping {} entries: {:?}", dropped.len(), dropped);
    }

    let summary = ImportSummary {
        records: records.len(),
        dropped,
    };
    store.replace(&DirectoryDocument::from_records(records)).await?;

    info!(
        "Imported {} record(s) into {}",
        summary.records,
        store.path().display()
    );
    Ok(summary)
}

/// Read a roster file and import it
pub async fn import_roster_file(store: &SnapshotStore, roster_path: &Path) -> Result<ImportSummary> {
    let text = tokio::fs::read_to_string(roster_path).await?;
    import_roster(store, &text).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sections() {
        let columns = parse_roster(
            "Practice roster\nDr. Ignored\nDOCTORS:\nDr. A\n\nDr. B\nSpecialties:\nCardiology, Pediatrics\nUrology\n",
        );

        assert_eq!(columns.doctors, vec!["Dr. A", "Dr. B"]);
        assert_eq!(columns.specialties, vec!["Cardiology, Pediatrics", "Urology"]);
    }

    #[test]
    fn test_other_headers_skipped() {
        let columns = parse_roster("Doctors:\nDr. A\nUpdated: 2024\nSpecialties:\nUrology\nNotes: none\n");

        assert_eq!(columns.doctors, vec!["Dr. A"]);
        assert_eq!(columns.specialties, vec!["Urology"]);
    }

    #[test]
    fn test_no_doctors_header() {
        let columns = parse_roster("Dr. A\nUrology\n");
        assert_eq!(columns, RosterColumns::default());
    }

    #[test]
    fn test_pairing_drops_excess() {
        let columns = RosterColumns {
            doctors: vec!["A".into(), "B".into(), "C".into()],
            specialties: vec!["X".into(), "Y".into()],
        };

        let (records, dropped) = pair_columns(columns);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0], DirectoryRecord::new("A", "X"));
        assert_eq!(records[1], DirectoryRecord::new("B", "Y"));
        assert_eq!(dropped, vec!["C"]);
    }
}
