//! HTTP client for the NSE search endpoint.

use std::time::Duration;

use url::Url;

use crate::{
    symbol::{closest_candidate, extract_symbol_token, select_exact_match},
    types::{SearchResponse, SessionCredentials},
    Error,
};

/// Default path of the search endpoint, relative to the base URL.
pub const DEFAULT_SEARCH_PATH: &str = "/api/search/autocomplete";

/// Plain (non-rendering) HTTP client for the NSE search endpoint.
///
/// The endpoint rejects requests that do not carry the cookies NSE issues to
/// a real browser, so every call replays [`SessionCredentials`] harvested
/// from a rendering session: all cookies in one `Cookie` header and the
/// browser's own user agent. Each request builds a fresh `reqwest::Client`
/// with a 30-second timeout.
pub struct Client {
    /// Base URL for the site. Defaults to `https://www.nseindia.com`.
    base_api_url: String,
    search_path: String,
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl Client {
    /// Creates a new client pointing at production NSE.
    pub fn new() -> Self {
        Self {
            base_api_url: "https://www.nseindia.com".to_string(),
            search_path: DEFAULT_SEARCH_PATH.to_string(),
        }
    }

    /// Creates a new client with a custom base URL. Used for testing with wiremock.
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_api_url: base_url.trim_end_matches('/').to_string(),
            search_path: DEFAULT_SEARCH_PATH.to_string(),
        }
    }

    /// Overrides the search endpoint path.
    pub fn with_search_path(mut self, path: &str) -> Self {
        self.search_path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };
        self
    }

    fn search_url(&self, query: &str) -> Result<Url, Error> {
        let mut url = Url::parse(format!("{}{}", &self.base_api_url, &self.search_path).as_str())
            .map_err(|e| {
                tracing::error!("Invalid URL constructed: {}", e);
                Error::RequestFailed
            })?;
        url.query_pairs_mut().append_pair("q", query);
        Ok(url)
    }

    /// Runs a free-text search and returns the parsed `results`.
    pub async fn search(
        &self,
        query: &str,
        credentials: &SessionCredentials,
    ) -> Result<SearchResponse, Error> {
        let url = self.search_url(query)?;
        let client = reqwest::Client::builder()
            .user_agent(credentials.user_agent.as_str())
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build HTTP client: {}", e);
                Error::RequestFailed
            })?;
        let mut req = client
            .get(url)
            .header("accept", "application/json, text/plain, */*")
            .header("accept-language", "en-US,en;q=0.9")
            .header("referer", format!("{}/", self.base_api_url))
            .header("sec-fetch-dest", "empty")
            .header("sec-fetch-mode", "cors")
            .header("sec-fetch-site", "same-origin");
        if let Some(cookie) = credentials.cookie_header() {
            req = req.header("cookie", cookie);
        }
        let resp = req.send().await.map_err(|e| {
            tracing::error!("Failed to query search endpoint: {}", e);
            Error::RequestFailed
        })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| {
            tracing::error!("Failed to read response body: {}", e);
            Error::RequestFailed
        })?;

        if !status.is_success() {
            let snippet = truncate_body(&body);
            tracing::error!("Search failed with status {}: {}", status, snippet);
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: snippet,
            });
        }

        serde_json::from_str::<SearchResponse>(&body).map_err(|e| {
            let snippet = truncate_body(&body);
            tracing::error!("Failed to parse search response: {} | body: {}", e, snippet);
            Error::MalformedBody(e.to_string())
        })
    }

    /// Resolves a company name to its trading symbol.
    ///
    /// Returns `Ok(None)` when no result's `symbol_info` equals `name`
    /// case-insensitively, or when the matching result carries no
    /// `symbol=` token.
    pub async fn find_symbol(
        &self,
        name: &str,
        credentials: &SessionCredentials,
    ) -> Result<Option<String>, Error> {
        let resp = self.search(name, credentials).await?;
        match select_exact_match(&resp.results, name) {
            Some(hit) => {
                let token = extract_symbol_token(&hit.url);
                if token.is_none() {
                    tracing::warn!("Match for '{}' has no symbol in url '{}'", name, hit.url);
                }
                Ok(token)
            }
            None => {
                if let Some((candidate, score)) = closest_candidate(&resp.results, name) {
                    tracing::debug!(
                        "No exact match for '{}' ({} results); closest was '{}' ({:.2})",
                        name,
                        resp.results.len(),
                        candidate,
                        score
                    );
                }
                Ok(None)
            }
        }
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 2000;
    if body.len() <= MAX {
        body.to_string()
    } else {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...[truncated]", &body[..end])
    }
}
