//! Persistence boundary for enriched records.
//!
//! A run writes its records to two places: the remote table (one create
//! call per record, in order) and a local CSV export of the whole sequence.
//! [`PersistenceSink`] treats both as one boundary; [`RosterSink`] is the
//! production implementation over [`AirtableStore`] and [`CsvExporter`].

mod airtable;
mod export;

use async_trait::async_trait;
use rosterlink_shared::{EnrichedRecord, RecordId, Result};

pub use airtable::AirtableStore;
pub use export::{CSV_HEADERS, CsvExporter};

/// Where enriched records end up.
#[async_trait]
pub trait PersistenceSink: Send + Sync {
    /// Pre-flight check that the remote store accepts our credentials.
    async fn verify(&self) -> Result<()> {
        Ok(())
    }

    /// Write a single record to the remote store.
    async fn persist_one(&self, record: &EnrichedRecord) -> Result<RecordId>;

    /// Write the full record sequence to the tabular export.
    async fn export_all(&self, records: &[EnrichedRecord]) -> Result<()>;

    /// Human-facing link to the persisted data, if the sink has one.
    fn store_link(&self) -> Option<String> {
        None
    }
}

/// Remote table plus local CSV file.
pub struct RosterSink {
    store: AirtableStore,
    exporter: CsvExporter,
}

impl RosterSink {
    pub fn new(store: AirtableStore, exporter: CsvExporter) -> Self {
        Self { store, exporter }
    }
}

#[async_trait]
impl PersistenceSink for RosterSink {
    async fn verify(&self) -> Result<()> {
        self.store.verify().await
    }

    async fn persist_one(&self, record: &EnrichedRecord) -> Result<RecordId> {
        self.store.create(record).await
    }

    async fn export_all(&self, records: &[EnrichedRecord]) -> Result<()> {
        self.exporter.export(records)
    }

    fn store_link(&self) -> Option<String> {
        Some(self.store.web_link())
    }
}
