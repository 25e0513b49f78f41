//! Sequences extraction, date filtering, enrichment and persistence.

use chrono::{Datelike, NaiveDate};
use tracing::{info, warn};

use crate::bridge::SessionBridge;
use crate::config::RunConfig;
use crate::error::NameWatchError;
use crate::extract::BseExtractor;
use crate::record::{filter_by_date, merge_symbols, Record};
use crate::session::SessionFactory;
use crate::store::ResultStore;
use crate::validation::{display_date, validate_display_date};

/// What one invocation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub total_records: usize,
    /// Display date the enrichment targeted.
    pub date: String,
    /// Records carrying `date`, after enrichment.
    pub todays: Vec<Record>,
    /// Whether the result file was rewritten.
    pub persisted: bool,
}

/// Owns every piece of state for one run.
pub struct Orchestrator<A, B> {
    extractor: BseExtractor<A>,
    bridge: SessionBridge<B>,
    store: ResultStore,
    today: NaiveDate,
}

impl<A: SessionFactory, B: SessionFactory> Orchestrator<A, B> {
    /// `bse` opens sessions for extraction, `nse` for the lookup bridge.
    pub fn new(bse: A, nse: B, config: &RunConfig) -> Self {
        Self {
            extractor: BseExtractor::new(bse, config),
            bridge: SessionBridge::new(nse, config),
            store: ResultStore::new(config.output_path.clone()),
            today: chrono::Local::now().date_naive(),
        }
    }

    /// Pins "today", which picks both the form year and the date filter.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    /// Extracts this year's name changes, enriches today's, and rewrites the
    /// result file. The file is left alone when extraction fails or finds
    /// nothing.
    pub async fn run_full(&self) -> Result<RunSummary, NameWatchError> {
        let date = display_date(self.today);
        info!("Extracting {} name changes", self.today.year());
        let outcome = self.extractor.run(self.today.year()).await?;
        if outcome.stopped_early() {
            warn!(
                "Only {}/{} page(s) were read",
                outcome.pages_read, outcome.total_pages
            );
        }

        let mut records = outcome.records;
        if records.is_empty() {
            warn!(
                "No records extracted, leaving {} untouched",
                self.store.path().display()
            );
            return Ok(RunSummary {
                total_records: 0,
                date,
                todays: Vec::new(),
                persisted: false,
            });
        }

        let todays = self.enrich(&mut records, &date).await;
        self.store.save(&records)?;
        Ok(RunSummary {
            total_records: records.len(),
            date,
            todays,
            persisted: true,
        })
    }

    /// Re-runs enrichment on the stored records for one display date.
    pub async fn run_for_date(&self, date: &str) -> Result<RunSummary, NameWatchError> {
        let date = validate_display_date(date)?;
        let mut records = self.store.load()?;
        info!(
            "Loaded {} record(s) from {}",
            records.len(),
            self.store.path().display()
        );

        let todays = self.enrich(&mut records, &date).await;
        let persisted = !records.is_empty();
        if persisted {
            self.store.save(&records)?;
        }
        Ok(RunSummary {
            total_records: records.len(),
            date,
            todays,
            persisted,
        })
    }

    /// Resolves symbols for the records dated `date` and merges them back.
    /// A bridge that cannot start leaves the records unenriched.
    async fn enrich(&self, records: &mut [Record], date: &str) -> Vec<Record> {
        let subset = filter_by_date(records, date);
        if subset.is_empty() {
            info!("No name changes dated {}", date);
            return subset;
        }
        info!("{} name change(s) dated {}", subset.len(), date);

        match self.bridge.resolve_all(&subset).await {
            Ok(lookups) => {
                let updated = merge_symbols(records, &lookups);
                info!("Updated {} record(s) with symbols", updated);
            }
            Err(e) => warn!("Skipping symbol lookup: {}", e),
        }
        filter_by_date(records, date)
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
