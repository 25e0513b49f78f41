//! Extracted name-change records and the symbol merge.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

/// One row of the name-change table.
///
/// `resolved_symbol` is tri-state on disk: the `ticker` key is absent until
/// a lookup has been attempted, `null` when the lookup found no exact
/// match, and the trading symbol otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub security_code: String,
    pub old_name: String,
    pub new_name: String,
    /// Display-format date (`01 Jan 2024`), never parsed.
    #[serde(rename = "date")]
    pub change_date: String,
    #[serde(
        rename = "ticker",
        alias = "resolved_symbol",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_or_null"
    )]
    pub resolved_symbol: Option<Option<String>>,
}

/// Records read from one rendered page, in display order.
pub type PageBatch = Vec<Record>;

/// Every record of one run, page order then row order.
pub type RunResult = Vec<Record>;

fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl Record {
    /// Builds a record from raw cell text, trimming every field.
    pub fn new(security_code: &str, old_name: &str, new_name: &str, change_date: &str) -> Self {
        Self {
            security_code: security_code.trim().to_string(),
            old_name: old_name.trim().to_string(),
            new_name: new_name.trim().to_string(),
            change_date: change_date.trim().to_string(),
            resolved_symbol: None,
        }
    }

    /// Maps the first four cells of a table row. `None` for rows with fewer
    /// than four cells, which are layout artifacts rather than data.
    pub fn from_cells(cells: &[String]) -> Option<Self> {
        match cells {
            [code, old, new, date, ..] => Some(Self::new(code, old, new, date)),
            _ => None,
        }
    }

    pub fn lookup_attempted(&self) -> bool {
        self.resolved_symbol.is_some()
    }

    /// The resolved symbol, if a lookup found one.
    pub fn symbol(&self) -> Option<&str> {
        self.resolved_symbol.as_ref().and_then(|s| s.as_deref())
    }
}

/// Outcome of resolving one record's new name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    Resolved(String),
    NoMatch,
    /// The lookup itself failed; the record keeps whatever it had.
    Failed,
}

/// A lookup result keyed by the record it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolLookup {
    pub security_code: String,
    pub outcome: LookupOutcome,
}

/// Records whose display date equals `date` exactly.
pub fn filter_by_date(records: &[Record], date: &str) -> Vec<Record> {
    records
        .iter()
        .filter(|r| r.change_date == date)
        .cloned()
        .collect()
}

/// Writes lookup outcomes back onto `records` by `security_code`.
///
/// Only `resolved_symbol` is touched, and only on records whose code has an
/// outcome. `Failed` outcomes leave the record unchanged. Returns the number
/// of records updated.
pub fn merge_symbols(records: &mut [Record], lookups: &[SymbolLookup]) -> usize {
    let by_code: HashMap<&str, &LookupOutcome> = lookups
        .iter()
        .map(|l| (l.security_code.as_str(), &l.outcome))
        .collect();

    let mut updated = 0;
    for record in records.iter_mut() {
        let Some(outcome) = by_code.get(record.security_code.as_str()) else {
            continue;
        };
        match outcome {
            LookupOutcome::Resolved(symbol) => {
                record.resolved_symbol = Some(Some(symbol.clone()));
                updated += 1;
            }
            LookupOutcome::NoMatch => {
                record.resolved_symbol = Some(None);
                updated += 1;
            }
            LookupOutcome::Failed => {}
        }
    }
    updated
}
