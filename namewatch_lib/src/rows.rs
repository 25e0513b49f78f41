//! Reads data rows from the currently rendered results page.

use tracing::{debug, warn};

use crate::config::{BseSelectors, Timeouts};
use crate::error::NameWatchError;
use crate::record::{PageBatch, Record};
use crate::session::{RenderSession, RowRead};
use crate::waiter::Waiter;

#[derive(Debug, Clone)]
pub struct RowExtractor {
    selectors: BseSelectors,
    timeouts: Timeouts,
    waiter: Waiter,
}

impl RowExtractor {
    pub fn new(selectors: BseSelectors, timeouts: Timeouts, waiter: Waiter) -> Self {
        Self {
            selectors,
            timeouts,
            waiter,
        }
    }

    /// Extracts every data row on the current page.
    ///
    /// Header and pager rows are recognized by class, rows with fewer than
    /// four cells are layout filler, and rows that go stale mid-read are
    /// dropped with a warning. A missing table is an error so the caller can
    /// retry.
    pub async fn extract<S>(&self, session: &S) -> Result<PageBatch, NameWatchError>
    where
        S: RenderSession + ?Sized,
    {
        self.waiter
            .wait_for_element(session, &self.selectors.table, self.timeouts.page_table)
            .await?;
        self.waiter.scroll_page(session).await;

        let rows = session.table_rows(&self.selectors.table).await?;
        let mut batch = PageBatch::new();
        for (idx, row) in rows.into_iter().enumerate() {
            let (class, cells) = match row {
                RowRead::Row { class, cells } => (class, cells),
                RowRead::Stale => {
                    warn!("Row {} went stale while reading, skipping", idx);
                    continue;
                }
            };
            if self.is_structural(&class) {
                continue;
            }
            match Record::from_cells(&cells) {
                Some(record) => batch.push(record),
                None => debug!("Row {} has {} cells, skipping", idx, cells.len()),
            }
        }
        debug!("Extracted {} records from page", batch.len());
        Ok(batch)
    }

    fn is_structural(&self, class: &str) -> bool {
        class
            .split_whitespace()
            .any(|c| c == self.selectors.header_class || c == self.selectors.pager_class)
    }
}
