//! Extraction and enrichment engine for BSE company name changes.
//!
//! A browser session drives the BSE name-change form and walks its results
//! grid; records dated today are then resolved to NSE trading symbols over
//! plain HTTP using credentials borrowed from a second browser session.

pub mod bridge;
pub mod config;
pub mod error;
pub mod error_page;
pub mod extract;
pub mod form;
pub mod orchestrator;
pub mod pagination;
pub mod record;
pub mod retry;
pub mod rows;
pub mod session;
pub mod store;
pub mod validation;
pub mod waiter;

pub use bridge::SessionBridge;
pub use config::RunConfig;
pub use error::{FormError, NameWatchError};
pub use extract::BseExtractor;
pub use orchestrator::{Orchestrator, RunSummary};
pub use record::{LookupOutcome, Record, RunResult, SymbolLookup};
pub use session::{ChromeFactory, RenderSession, SessionError, SessionFactory};
pub use store::{ResultStore, StoreError};
