//! Error types for the search client.

/// Errors that can occur when querying the NSE search endpoint.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// An HTTP request failed (network error, timeout, or unreadable body).
    #[error("Request failed")]
    RequestFailed,
    /// The endpoint returned a non-success status with a body snippet.
    #[error("Request failed with status {status}")]
    HttpStatus { status: u16, body: String },
    /// The body was not the expected JSON document.
    #[error("Malformed search response: {0}")]
    MalformedBody(String),
}
