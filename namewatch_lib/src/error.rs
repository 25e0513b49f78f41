//! Error types for the library layer.

use std::fmt;

use crate::session::SessionError;
use crate::store::StoreError;
use crate::waiter::WaitTimeout;

/// The form controls on the source page could not be driven. Fatal for the
/// whole run.
#[derive(thiserror::Error, Debug)]
pub enum FormError {
    #[error("form element not found: {0}")]
    ElementNotFound(String),
    #[error("year {0} is not offered by the year selector")]
    UnsupportedYear(i32),
}

/// Errors produced by the extraction and enrichment engine.
///
/// Variants map onto the recovery scope of each failure: row-level and
/// lookup-level errors are swallowed by their callers, session-level errors
/// ([`Self::is_restartable`]) trigger a fresh browser session, everything
/// else ends the run.
#[derive(Debug)]
pub enum NameWatchError {
    /// A rendering-session operation failed.
    Session(SessionError),
    /// An element reference was invalidated by a re-render.
    TransientElement(String),
    /// An element or settle wait ran out of time.
    Timeout(WaitTimeout),
    /// The server substituted its error interstitial for the real page.
    ServerInterstitial,
    /// The results table never appeared after submitting the form.
    TableLoadTimeout,
    /// The year selector or submit control could not be used.
    FatalForm(FormError),
    /// The symbol search endpoint failed or returned garbage.
    LookupHttp(nse_api::Error),
    /// Reading or writing the result file failed.
    Store(StoreError),
    /// User-provided input failed validation.
    InvalidInput(String),
}

impl NameWatchError {
    /// Whether the error is confined to the current browser session, so a
    /// fresh session may succeed.
    pub fn is_restartable(&self) -> bool {
        matches!(self, Self::ServerInterstitial | Self::TableLoadTimeout)
    }
}

impl fmt::Display for NameWatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Session(e) => write!(f, "Session error: {}", e),
            Self::TransientElement(msg) => write!(f, "Stale element: {}", msg),
            Self::Timeout(e) => write!(f, "Timeout: {}", e),
            Self::ServerInterstitial => write!(f, "Server returned its error page"),
            Self::TableLoadTimeout => write!(f, "Results table did not load"),
            Self::FatalForm(e) => write!(f, "Form error: {}", e),
            Self::LookupHttp(e) => write!(f, "Lookup error: {}", e),
            Self::Store(e) => write!(f, "Store error: {}", e),
            Self::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
        }
    }
}

impl std::error::Error for NameWatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Session(e) => Some(e),
            Self::Timeout(e) => Some(e),
            Self::FatalForm(e) => Some(e),
            Self::LookupHttp(e) => Some(e),
            Self::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SessionError> for NameWatchError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::StaleElement(msg) => Self::TransientElement(msg),
            other => Self::Session(other),
        }
    }
}

impl From<WaitTimeout> for NameWatchError {
    fn from(e: WaitTimeout) -> Self {
        Self::Timeout(e)
    }
}

impl From<FormError> for NameWatchError {
    fn from(e: FormError) -> Self {
        Self::FatalForm(e)
    }
}

impl From<nse_api::Error> for NameWatchError {
    fn from(e: nse_api::Error) -> Self {
        Self::LookupHttp(e)
    }
}

impl From<StoreError> for NameWatchError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}
