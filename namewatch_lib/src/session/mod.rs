//! Rendering-session capability interface.
//!
//! The extraction state machine only talks to [`RenderSession`]; the
//! Chrome DevTools backend lives in [`chrome`]. Methods take `&self` so a
//! session can be shared by the retry supervisor and the step it wraps.

use async_trait::async_trait;
use nse_api::types::SessionCookie;

pub mod chrome;
#[cfg(test)]
pub(crate) mod fake;

pub use chrome::{ChromeFactory, ChromeSession};

/// Errors raised by a rendering backend.
#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("failed to start browser: {0}")]
    Launch(String),
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },
    #[error("script failed: {0}")]
    Script(String),
    #[error("element not found: {0}")]
    ElementNotFound(String),
    #[error("stale element reference: {0}")]
    StaleElement(String),
    #[error("browser protocol error: {0}")]
    Protocol(String),
}

/// One `<tr>` of a table, as read from the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowRead {
    Row { class: String, cells: Vec<String> },
    /// The row was re-rendered while being read.
    Stale,
}

impl RowRead {
    pub fn cells(class: &str, cells: &[&str]) -> Self {
        Self::Row {
            class: class.to_string(),
            cells: cells.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// One entry of a pager row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PagerCell {
    /// A clickable page link with its label.
    Link(String),
    /// The current page, rendered as a plain label.
    Current(String),
    Other,
}

/// A live browser page.
#[async_trait]
pub trait RenderSession: Send + Sync {
    /// Loads `url` and waits for the navigation to commit.
    async fn navigate(&self, url: &str) -> Result<(), SessionError>;

    /// Evaluates a script expression and returns its JSON value
    /// (`Null` for `undefined`).
    async fn run_script(&self, script: &str) -> Result<serde_json::Value, SessionError>;

    /// All cookies visible to the current page.
    async fn cookies(&self) -> Result<Vec<SessionCookie>, SessionError>;

    /// `navigator.userAgent` as the page sees it.
    async fn current_user_agent(&self) -> Result<String, SessionError>;

    async fn element_exists(&self, selector: &str) -> Result<bool, SessionError>;

    /// Visible text of the first element matching `selector`.
    async fn element_text(&self, selector: &str) -> Result<Option<String>, SessionError>;

    /// Visible text of the document body.
    async fn body_text(&self) -> Result<String, SessionError>;

    /// Sets a `<select>` to `value`. `Ok(false)` when no option has that value.
    async fn select_option(&self, selector: &str, value: &str) -> Result<bool, SessionError>;

    /// Clicks an element from script, so it need not be visible.
    async fn click(&self, selector: &str) -> Result<(), SessionError>;

    /// Direct rows of the table matching `table_selector`, in display order.
    async fn table_rows(&self, table_selector: &str) -> Result<Vec<RowRead>, SessionError>;

    /// Cells matching `selector`, classified as link or current-page label.
    async fn pager_cells(&self, selector: &str) -> Result<Vec<PagerCell>, SessionError>;

    /// Clicks the `index`-th link (0-based, display order) among the cells
    /// matching `selector`.
    async fn click_pager_link(&self, selector: &str, index: usize) -> Result<(), SessionError>;

    /// Tears the session down. Safe to call more than once.
    async fn close(&self);
}

/// Opens fresh rendering sessions. Every opened session must be closed by
/// the caller.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    type Session: RenderSession;

    async fn open(&self) -> Result<Self::Session, SessionError>;
}
