//! Matching search results against a company name and pulling the trading
//! symbol out of a result URL.

use regex::Regex;

use crate::types::SearchResult;

/// Returns the first result whose `symbol_info` equals `name`, ignoring case.
/// Leading and trailing whitespace is ignored on both sides; nothing else is.
pub fn select_exact_match<'a>(results: &'a [SearchResult], name: &str) -> Option<&'a SearchResult> {
    let wanted = name.trim().to_lowercase();
    results
        .iter()
        .find(|r| r.symbol_info.trim().to_lowercase() == wanted)
}

/// Extracts `<token>` from a `symbol=<token>` segment, stopping at the next
/// `&` or the end of the string.
pub fn extract_symbol_token(url: &str) -> Option<String> {
    let re = Regex::new(r"symbol=([^&]+)").ok()?;
    re.captures(url)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
}

/// Best-scoring `symbol_info` by Jaro-Winkler similarity. Diagnostic only:
/// resolution never accepts anything but an exact match.
pub fn closest_candidate<'a>(results: &'a [SearchResult], name: &str) -> Option<(&'a str, f64)> {
    let wanted = name.trim().to_lowercase();
    results
        .iter()
        .map(|r| {
            let score = strsim::jaro_winkler(&wanted, &r.symbol_info.trim().to_lowercase());
            (r.symbol_info.as_str(), score)
        })
        .max_by(|a, b| a.1.total_cmp(&b.1))
}
