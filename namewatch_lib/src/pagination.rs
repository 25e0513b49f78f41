//! Walks the results grid page by page.

use regex::Regex;
use tracing::{debug, error, info, warn};

use crate::config::{BseSelectors, Pacing};
use crate::record::RunResult;
use crate::retry::{with_retry, RetryPolicy};
use crate::rows::RowExtractor;
use crate::session::{PagerCell, RenderSession};
use crate::waiter::Waiter;

/// Records gathered by one pagination pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaginationOutcome {
    pub records: RunResult,
    pub pages_read: usize,
    /// Last page-count estimate.
    pub total_pages: usize,
}

impl PaginationOutcome {
    /// Whether the pass stopped before the last known page.
    pub fn stopped_early(&self) -> bool {
        self.pages_read < self.total_pages
    }
}

#[derive(Debug, Clone)]
pub struct Paginator {
    selectors: BseSelectors,
    pacing: Pacing,
    retry: RetryPolicy,
    waiter: Waiter,
    rows: RowExtractor,
}

impl Paginator {
    pub fn new(
        selectors: BseSelectors,
        pacing: Pacing,
        retry: RetryPolicy,
        waiter: Waiter,
        rows: RowExtractor,
    ) -> Self {
        Self {
            selectors,
            pacing,
            retry,
            waiter,
            rows,
        }
    }

    /// Reads every page reachable from the current one.
    ///
    /// Never fails: extraction that keeps failing after retries, or a pager
    /// link that cannot be found or clicked, ends the pass early with the
    /// pages read so far.
    pub async fn collect<S>(&self, session: &S) -> PaginationOutcome
    where
        S: RenderSession + ?Sized,
    {
        let mut outcome = PaginationOutcome {
            total_pages: self.total_pages(session).await,
            ..PaginationOutcome::default()
        };
        info!("Results span {} page(s)", outcome.total_pages);

        let mut current = 1usize;
        loop {
            let label = format!("page {} extraction", current);
            match with_retry(&label, &self.retry, || self.rows.extract(session)).await {
                Ok(batch) => {
                    info!("Page {}: {} record(s)", current, batch.len());
                    outcome.records.extend(batch);
                    outcome.pages_read += 1;
                }
                Err(e) => {
                    error!("Giving up on page {}: {}", current, e);
                    break;
                }
            }

            // The estimate can grow once the pager shows more links.
            outcome.total_pages = outcome.total_pages.max(self.total_pages(session).await);
            if current >= outcome.total_pages {
                break;
            }

            if let Err(e) = self.turn_page(session, current).await {
                warn!("Stopping after page {}: {}", current, e);
                break;
            }
            current += 1;
        }

        info!(
            "Collected {} record(s) from {}/{} page(s)",
            outcome.records.len(),
            outcome.pages_read,
            outcome.total_pages
        );
        outcome
    }

    /// Page count from the pager caption, else the link count plus the
    /// current page, else 1.
    pub async fn total_pages<S>(&self, session: &S) -> usize
    where
        S: RenderSession + ?Sized,
    {
        if let Ok(Some(caption)) = session.element_text(&self.selectors.pager_caption).await {
            if let Some(n) = parse_caption(&caption) {
                return n;
            }
        }
        match session.pager_cells(&self.selectors.pager_cells).await {
            Ok(cells) => {
                let links = cells.iter().filter(|c| matches!(c, PagerCell::Link(_))).count();
                if links > 0 {
                    links + 1
                } else {
                    1
                }
            }
            Err(e) => {
                debug!("pager scan failed: {}", e);
                1
            }
        }
    }

    async fn turn_page<S>(&self, session: &S, current: usize) -> Result<(), String>
    where
        S: RenderSession + ?Sized,
    {
        let cells = session
            .pager_cells(&self.selectors.pager_cells)
            .await
            .map_err(|e| e.to_string())?;
        let links: Vec<String> = cells
            .into_iter()
            .filter_map(|c| match c {
                PagerCell::Link(label) => Some(label),
                _ => None,
            })
            .collect();
        let index = next_link_index(&links, current)
            .ok_or_else(|| format!("no link to page {}", current + 1))?;
        debug!("Clicking pager link {} ({:?})", index, links.get(index));
        session
            .click_pager_link(&self.selectors.pager_cells, index)
            .await
            .map_err(|e| e.to_string())?;

        self.pacing.page_turn.pause().await;
        if let Err(e) = self.waiter.await_settled(session).await {
            warn!("Page {} settle timed out: {}", current + 1, e);
        }
        Ok(())
    }
}

/// Page count from a caption such as `Page 1 of 12`.
fn parse_caption(caption: &str) -> Option<usize> {
    let re = Regex::new(r"(?i)\bof\s+(\d+)").ok()?;
    re.captures(caption)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .filter(|n| *n > 0)
}

/// Index of the link leading to `current + 1`: by label, else by position.
/// The current page is a plain label, so links before it are shifted by one.
pub fn next_link_index(links: &[String], current: usize) -> Option<usize> {
    let wanted = (current + 1).to_string();
    links
        .iter()
        .position(|l| l.trim() == wanted)
        .or_else(|| {
            let positional = current.checked_sub(1)?;
            (positional < links.len()).then_some(positional)
        })
}
