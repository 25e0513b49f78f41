use anyhow::Result;
use namewatch_lib::Record;
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Clone, Debug)]
pub enum OutputFormat {
    Table,
    Json,
    Markdown,
}

#[derive(Tabled, Serialize)]
struct ChangeRow {
    #[tabled(rename = "Code")]
    #[serde(rename = "Code")]
    security_code: String,
    #[tabled(rename = "Old Name")]
    #[serde(rename = "Old Name")]
    old_name: String,
    #[tabled(rename = "New Name")]
    #[serde(rename = "New Name")]
    new_name: String,
    #[tabled(rename = "Date")]
    #[serde(rename = "Date")]
    date: String,
    #[tabled(rename = "Symbol")]
    #[serde(rename = "Symbol")]
    symbol: String,
}

fn build_change_rows(records: &[Record]) -> Vec<ChangeRow> {
    records
        .iter()
        .map(|r| ChangeRow {
            security_code: r.security_code.clone(),
            old_name: r.old_name.clone(),
            new_name: r.new_name.clone(),
            date: r.change_date.clone(),
            symbol: symbol_label(r),
        })
        .collect()
}

fn symbol_label(record: &Record) -> String {
    match &record.resolved_symbol {
        Some(Some(symbol)) => symbol.clone(),
        Some(None) => "no match".to_string(),
        None => "-".to_string(),
    }
}

pub fn print_changes(records: &[Record], date: &str, format: &OutputFormat) -> Result<()> {
    if records.is_empty() && !matches!(format, OutputFormat::Json) {
        println!("No name changes dated {}", date);
        return Ok(());
    }
    match format {
        OutputFormat::Table => println!("{}", Table::new(build_change_rows(records))),
        OutputFormat::Markdown => {
            let mut table = Table::new(build_change_rows(records));
            table.with(Style::markdown());
            println!("{}", table);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&build_change_rows(records))?);
        }
    }
    Ok(())
}
