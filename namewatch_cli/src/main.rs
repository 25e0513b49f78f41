mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use namewatch_lib::{ChromeFactory, NameWatchError, Orchestrator, RunConfig, RunSummary};

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "namewatch")]
#[command(about = "Track BSE company name changes and resolve their NSE symbols")]
struct Cli {
    /// Re-run symbol lookup for stored records with this date (e.g. "01 Jan 2024")
    /// instead of scraping
    date: Option<String>,

    /// Result file (defaults to NAMEWATCH_OUTPUT or bse_name_changes.json)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Show the browser window
    #[arg(long)]
    headful: bool,

    /// Report format: table, json or markdown
    #[arg(long, default_value = "table")]
    format: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("namewatch=info".parse()?)
                .add_directive("namewatch_lib=info".parse()?)
                .add_directive("nse_api=info".parse()?),
        )
        .with_target(false)
        .with_writer(std::io::stdout)
        .init();

    let cli = Cli::parse();

    let format = match cli.format.as_str() {
        "json" => OutputFormat::Json,
        "markdown" | "md" => OutputFormat::Markdown,
        _ => OutputFormat::Table,
    };

    let mut config = RunConfig::from_env();
    if let Some(path) = cli.output {
        config.output_path = path;
    }
    if cli.headful {
        config.browser.headless = false;
    }

    let bse = ChromeFactory::new(config.browser.clone());
    let nse = ChromeFactory::new(config.browser.clone());
    let orchestrator = Orchestrator::new(bse, nse, &config);

    let result = match cli.date.as_deref() {
        Some(date) => orchestrator.run_for_date(date).await,
        None => orchestrator.run_full().await,
    };
    finish(result, &format)
}

/// Reports the run on stdout. A failed run is logged, not propagated, so
/// every outcome exits the same way.
fn finish(result: Result<RunSummary, NameWatchError>, format: &OutputFormat) -> Result<()> {
    let summary = match result {
        Ok(summary) => summary,
        Err(e) => {
            tracing::error!("Run aborted: {}", e);
            return Ok(());
        }
    };

    tracing::info!(
        "{} record(s), {} dated {}, file {}",
        summary.total_records,
        summary.todays.len(),
        summary.date,
        if summary.persisted { "updated" } else { "unchanged" }
    );
    output::print_changes(&summary.todays, &summary.date, format)
}
