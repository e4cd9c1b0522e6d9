//! Command-line parsing for the World Bank ETL.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! pipeline stages; `app` turns the parsed args into a `PipelineConfig`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::{DEFAULT_PAGE_SIZE, SourceIndicator};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "wb-etl", version, about = "World Bank indicator ETL (API -> CSV + SQLite)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch, clean, derive, validate, and persist (default).
    Run(RunArgs),
    /// Print summary rankings from an existing clean CSV.
    Report(ReportArgs),
    /// Run the quality checks against an existing clean CSV.
    Check(CheckArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct RunArgs {
    /// First year of the retrieval window (default: end year - 4).
    #[arg(long)]
    pub start_year: Option<i32>,

    /// Last year of the retrieval window (default: last calendar year).
    #[arg(long)]
    pub end_year: Option<i32>,

    /// Indicator to fetch as `CODE` or `CODE=Name`; repeatable. Defaults to
    /// population, GDP (current US$), and life expectancy.
    #[arg(long = "indicator", value_name = "CODE[=NAME]", value_parser = parse_indicator)]
    pub indicators: Vec<SourceIndicator>,

    /// API base URL (also read from `WORLDBANK_BASE_URL`).
    #[arg(long)]
    pub base_url: Option<String>,

    /// Records requested per page.
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: usize,

    /// Delay between consecutive requests, in milliseconds.
    #[arg(long, default_value_t = 100)]
    pub delay_ms: u64,

    /// HTTP timeout per request, in seconds.
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Raw snapshot CSV.
    #[arg(long, default_value = "data/raw/worldbank_raw.csv")]
    pub raw_csv: PathBuf,

    /// Clean output CSV.
    #[arg(long, default_value = "data/processed/worldbank_clean.csv")]
    pub clean_csv: PathBuf,

    /// SQLite database (deleted and rebuilt on every run).
    #[arg(long, default_value = "data/processed/worldbank.db")]
    pub db: PathBuf,

    /// DDL script to apply instead of the bundled schema.
    #[arg(long, value_name = "SQL")]
    pub schema: Option<PathBuf>,

    /// Entries per ranking.
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    /// Bar chart width (columns).
    #[arg(long, default_value_t = 40)]
    pub width: usize,

    /// Skip the rankings after the run.
    #[arg(long)]
    pub no_report: bool,
}

#[derive(Debug, Parser)]
pub struct ReportArgs {
    /// Clean CSV produced by `wb-etl run`.
    #[arg(long, value_name = "CSV", default_value = "data/processed/worldbank_clean.csv")]
    pub input: PathBuf,

    /// Entries per ranking.
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    /// Bar chart width (columns).
    #[arg(long, default_value_t = 40)]
    pub width: usize,
}

#[derive(Debug, Parser)]
pub struct CheckArgs {
    /// Clean CSV produced by `wb-etl run`.
    #[arg(long, value_name = "CSV", default_value = "data/processed/worldbank_clean.csv")]
    pub input: PathBuf,

    /// First year of the expected window.
    #[arg(long)]
    pub start_year: Option<i32>,

    /// Last year of the expected window.
    #[arg(long)]
    pub end_year: Option<i32>,
}

/// `CODE` or `CODE=Name`; a bare code of a default indicator keeps its default name.
pub fn parse_indicator(raw: &str) -> Result<SourceIndicator, String> {
    let (code, name) = match raw.split_once('=') {
        Some((code, name)) => (code.trim(), Some(name.trim())),
        None => (raw.trim(), None),
    };
    if code.is_empty() {
        return Err("indicator code must not be empty".to_string());
    }

    let name = match name.filter(|n| !n.is_empty()) {
        Some(n) => n.to_string(),
        None => SourceIndicator::defaults()
            .into_iter()
            .find(|d| d.code == code)
            .map(|d| d.name)
            .unwrap_or_else(|| code.to_string()),
    };
    Ok(SourceIndicator::new(code, name))
}
