//! Detection of the server's error interstitial.

use tracing::debug;

use crate::session::RenderSession;

/// Text the source site shows instead of content when a request fails
/// server-side.
pub const ERROR_MARKER: &str = "An error occurred while processing your request";

/// Whether the current page is the error interstitial. A body that cannot
/// be read (for instance mid-navigation) counts as a normal page.
pub async fn is_error_page<S>(session: &S) -> bool
where
    S: RenderSession + ?Sized,
{
    match session.body_text().await {
        Ok(text) => text.contains(ERROR_MARKER),
        Err(e) => {
            debug!("could not read page body: {}", e);
            false
        }
    }
}
