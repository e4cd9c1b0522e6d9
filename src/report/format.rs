//! Formatted terminal output: check results, run summary, ranking charts.
//!
//! We keep formatting code in one place so:
//! - the pipeline stages stay free of printing
//! - output changes are localized

use crate::app::pipeline::RunOutput;
use crate::domain::PipelineConfig;
use crate::plot::render_bars;
use crate::quality::ValidationReport;
use crate::report::{Ranking, ValueFormat};

/// `Checks:` block with one `- rule: true|false` line per rule.
pub fn format_checks(report: &ValidationReport) -> String {
    let mut out = String::from("Checks:\n");
    for (rule, ok) in report.iter() {
        out.push_str(&format!("- {rule}: {ok}\n"));
    }
    out
}

/// Counts and output locations of a finished run.
pub fn format_run_summary(run: &RunOutput, config: &PipelineConfig) -> String {
    let mut out = String::new();

    out.push_str("=== wb-etl - World Bank indicators ===\n");
    out.push_str(&format!(
        "Window: {}..={} | indicators: {}\n",
        config.window.start,
        config.window.end,
        crate::app::indicator_codes(&config.indicators).join(", ")
    ));
    out.push_str(&format!(
        "Countries: {} | raw rows: {} | clean rows: {} (derived: {})\n",
        run.entities.len(),
        run.raw_rows,
        run.clean.len(),
        run.derived_rows
    ));
    out.push_str(&format!(
        "SQLite: countries={} indicators={} facts={}",
        run.load.countries, run.load.indicators, run.load.facts
    ));
    if run.load.excluded > 0 {
        out.push_str(&format!(" (excluded {} unresolved rows)", run.load.excluded));
    }
    out.push('\n');

    out.push_str(&format!("Saved: {}\n", config.raw_csv.display()));
    out.push_str(&format!("Saved: {}\n", config.clean_csv.display()));
    out.push_str(&format!("Saved: {}\n", config.sqlite_db.display()));
    out
}

/// Title, underline, and bar chart for one ranking.
pub fn format_ranking(ranking: &Ranking, width: usize) -> String {
    let mut out = String::new();
    out.push_str(&ranking.title);
    out.push('\n');
    out.push_str(&"-".repeat(ranking.title.chars().count()));
    out.push('\n');

    let rows: Vec<(String, f64, String)> = ranking
        .entries
        .iter()
        .map(|e| (e.label.clone(), e.value, format_value(e.value, ranking.format)))
        .collect();
    out.push_str(&render_bars(&rows, width));
    out
}

pub fn format_rankings(rankings: &[Ranking], width: usize) -> String {
    rankings
        .iter()
        .map(|r| format_ranking(r, width))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_value(value: f64, format: ValueFormat) -> String {
    match format {
        ValueFormat::Billions => format!("{:.2} Mrd.", value / 1e9),
        ValueFormat::Percent => format!("{value:+.2}%"),
        ValueFormat::Currency => format!("{} US$", group_thousands(value.round() as i64)),
    }
}

fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    if n < 0 { format!("-{out}") } else { out }
}
