use serde::{Deserialize, Serialize};

/// Body returned by the search endpoint. A body without `results` is not a
/// search answer (the site sends e.g. `{"error":"blocked"}` to bots).
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
}

/// One search hit. Only the fields needed for symbol resolution are typed;
/// the endpoint sends more.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResult {
    #[serde(default)]
    pub symbol_info: String,
    #[serde(default)]
    pub url: String,
}
