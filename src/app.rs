//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - builds the run configuration
//! - runs the pipeline
//! - prints check results, the run summary, and rankings

use std::time::Duration;

use chrono::Datelike;
use clap::Parser;

use crate::cli::{CheckArgs, Command, ReportArgs, RunArgs};
use crate::domain::{DEFAULT_BASE_URL, PipelineConfig, SourceIndicator, YearWindow};
use crate::error::AppError;

pub mod pipeline;

const BASE_URL_ENV: &str = "WORLDBANK_BASE_URL";

/// Entry point for the `wb-etl` binary.
pub fn run() -> Result<(), AppError> {
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Run(args) => handle_run(args),
        Command::Report(args) => handle_report(args),
        Command::Check(args) => handle_check(args),
    }
}

fn handle_run(args: RunArgs) -> Result<(), AppError> {
    let config = config_from_args(&args)?;
    let run = pipeline::run_pipeline(&config)?;

    println!("{}", crate::report::format_checks(&run.checks));
    println!("{}", crate::report::format_run_summary(&run, &config));

    if config.report {
        let rankings = crate::report::standard_rankings(&run.clean, config.top_n);
        println!("{}", crate::report::format_rankings(&rankings, config.chart_width));
    }
    Ok(())
}

fn handle_report(args: ReportArgs) -> Result<(), AppError> {
    let rows = crate::io::read_clean_csv(&args.input)?;
    let rankings = crate::report::standard_rankings(&rows, args.top);
    if rankings.is_empty() {
        return Err(AppError::new(
            3,
            format!("No rankable rows in '{}'.", args.input.display()),
        ));
    }
    println!("{}", crate::report::format_rankings(&rankings, args.width));
    Ok(())
}

fn handle_check(args: CheckArgs) -> Result<(), AppError> {
    let rows = crate::io::read_clean_csv(&args.input)?;
    let window = resolve_window(args.start_year, args.end_year, current_year())?;
    let report = crate::quality::validate(&rows, window);
    println!("{}", crate::report::format_checks(&report));
    Ok(())
}

/// Build the run configuration from CLI args, `.env`, and defaults.
pub fn config_from_args(args: &RunArgs) -> Result<PipelineConfig, AppError> {
    dotenvy::dotenv().ok();

    let window = resolve_window(args.start_year, args.end_year, current_year())?;
    let mut config = PipelineConfig::with_window(window);

    config.base_url = args
        .base_url
        .clone()
        .or_else(|| std::env::var(BASE_URL_ENV).ok())
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    if !args.indicators.is_empty() {
        config.indicators = args.indicators.clone();
    }
    config.page_size = args.page_size.max(1);
    config.request_delay = Duration::from_millis(args.delay_ms);
    config.timeout = Duration::from_secs(args.timeout_secs.max(1));

    config.raw_csv = args.raw_csv.clone();
    config.clean_csv = args.clean_csv.clone();
    config.sqlite_db = args.db.clone();
    config.schema_path = args.schema.clone();

    config.report = !args.no_report;
    config.top_n = args.top;
    config.chart_width = args.width;

    Ok(config)
}

fn current_year() -> i32 {
    chrono::Local::now().year()
}

/// Default window is the five years ending last year; either bound can be overridden.
fn resolve_window(start: Option<i32>, end: Option<i32>, current_year: i32) -> Result<YearWindow, AppError> {
    let trailing = YearWindow::trailing(current_year);
    let end = end.unwrap_or(trailing.end);
    let start = start.unwrap_or(end - (trailing.end - trailing.start));
    if start > end {
        return Err(AppError::new(
            2,
            format!("Invalid year window: start {start} is after end {end}."),
        ));
    }
    Ok(YearWindow::new(start, end))
}

/// Rewrite argv so `wb-etl` defaults to `wb-etl run`.
///
/// Rules:
/// - `wb-etl`                      -> `wb-etl run`
/// - `wb-etl --start-year 2015 ..` -> `wb-etl run --start-year 2015 ..`
/// - `wb-etl --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("run".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    if arg1.starts_with('-') {
        argv.insert(1, "run".to_string());
    }
    argv
}

/// Names of the indicators a config will fetch (for logs and summaries).
pub fn indicator_codes(indicators: &[SourceIndicator]) -> Vec<&str> {
    indicators.iter().map(|i| i.code.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> RunArgs {
        let mut argv = vec!["wb-etl", "run"];
        argv.extend_from_slice(extra);
        match crate::cli::Cli::parse_from(argv).command {
            Command::Run(a) => a,
            _ => unreachable!(),
        }
    }

    #[test]
    fn default_window_is_trailing_five_years() {
        assert_eq!(resolve_window(None, None, 2025).unwrap(), YearWindow::new(2020, 2024));
        assert_eq!(resolve_window(None, None, 2025).unwrap(), YearWindow::trailing(2025));
        assert_eq!(resolve_window(Some(2010), Some(2012), 2025).unwrap(), YearWindow::new(2010, 2012));
        assert_eq!(resolve_window(None, Some(2015), 2025).unwrap(), YearWindow::new(2011, 2015));
        assert_eq!(resolve_window(Some(2020), Some(2019), 2025).unwrap_err().exit_code(), 2);
    }

    #[test]
    fn rewrite_defaults_to_run() {
        let v = |s: &[&str]| s.iter().map(|x| x.to_string()).collect::<Vec<_>>();
        assert_eq!(rewrite_args(v(&["wb-etl"])), v(&["wb-etl", "run"]));
        assert_eq!(rewrite_args(v(&["wb-etl", "--top", "5"])), v(&["wb-etl", "run", "--top", "5"]));
        assert_eq!(rewrite_args(v(&["wb-etl", "--help"])), v(&["wb-etl", "--help"]));
        assert_eq!(rewrite_args(v(&["wb-etl", "report"])), v(&["wb-etl", "report"]));
    }

    #[test]
    fn config_applies_overrides() {
        let config = config_from_args(&args(&[
            "--base-url",
            "http://localhost:9000/v2",
            "--indicator",
            "SP.POP.TOTL",
            "--delay-ms",
            "0",
            "--db",
            "out/test.db",
        ]))
        .unwrap();
        assert_eq!(config.base_url, "http://localhost:9000/v2");
        assert_eq!(indicator_codes(&config.indicators), vec!["SP.POP.TOTL"]);
        assert_eq!(config.request_delay, Duration::ZERO);
        assert_eq!(config.sqlite_db, std::path::PathBuf::from("out/test.db"));
        assert_eq!(config.derived.len(), 1);
    }
}
