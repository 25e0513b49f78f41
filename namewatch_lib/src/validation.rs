//! Display-date handling for the name-change table.

use chrono::NaiveDate;

use crate::error::NameWatchError;

/// Format of the table's date column, e.g. `01 Jan 2024`.
pub const DISPLAY_DATE_FORMAT: &str = "%d %b %Y";

pub fn display_date(date: NaiveDate) -> String {
    date.format(DISPLAY_DATE_FORMAT).to_string()
}

/// Checks that `input` is a display-format date and returns it trimmed.
/// The literal string is kept because records are compared as text.
pub fn validate_display_date(input: &str) -> Result<String, NameWatchError> {
    let trimmed = input.trim();
    NaiveDate::parse_from_str(trimmed, DISPLAY_DATE_FORMAT).map_err(|e| {
        NameWatchError::InvalidInput(format!(
            "'{}' is not a date like '01 Jan 2024': {}",
            trimmed, e
        ))
    })?;
    Ok(trimmed.to_string())
}
