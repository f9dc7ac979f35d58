//! CSV export of enriched records.

use std::path::{Path, PathBuf};

use rosterlink_shared::{EnrichedRecord, Result, RosterLinkError};
use tracing::info;

/// Fixed column order of the export.
pub const CSV_HEADERS: [&str; 5] = ["Name", "Description", "Contact", "Picture", "LinkedIn"];

/// Writes the full record sequence to a CSV file, replacing any previous export.
#[derive(Debug, Clone)]
pub struct CsvExporter {
    path: PathBuf,
}

impl CsvExporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the header and one row per record. The header is written even
    /// when `records` is empty.
    pub fn export(&self, records: &[EnrichedRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                RosterLinkError::Export(format!("cannot create {}: {e}", parent.display()))
            })?;
        }

        let mut wtr = csv::Writer::from_path(&self.path).map_err(|e| self.export_error(e))?;
        wtr.write_record(CSV_HEADERS)
            .map_err(|e| self.export_error(e))?;

        for record in records {
            wtr.write_record([
                record.name.as_str(),
                record.description.as_str(),
                record.contact.as_str(),
                record.picture.as_str(),
                record.profile_url.as_str(),
            ])
            .map_err(|e| self.export_error(e))?;
        }

        wtr.flush()
            .map_err(|e| RosterLinkError::Export(format!("{}: {e}", self.path.display())))?;

        info!(path = %self.path.display(), rows = records.len(), "records exported");
        Ok(())
    }

    fn export_error(&self, err: csv::Error) -> RosterLinkError {
        RosterLinkError::Export(format!("{}: {err}", self.path.display()))
    }
}
