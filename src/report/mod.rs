//! Summary rankings over the clean table.
//!
//! - top-N countries by an indicator in the latest year
//! - relative population change over the window (top and bottom)
//!
//! Formatting lives in `format`; the math here stays free of presentation.

use std::collections::BTreeMap;

use crate::domain::{CleanRow, GDP_PER_CAPITA_CALC, POPULATION};

pub mod format;

pub use format::*;

/// One ranked country.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranked {
    pub country_code: String,
    pub label: String,
    pub value: f64,
}

/// How ranking values are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFormat {
    /// Divided by 1e9, e.g. `1.43 Mrd.`
    Billions,
    Percent,
    Currency,
}

/// A titled ranking ready for printing.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    pub title: String,
    pub format: ValueFormat,
    pub entries: Vec<Ranked>,
}

/// Relative change between the first and last year a country reports.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    pub country_code: String,
    pub label: String,
    pub first_year: i32,
    pub last_year: i32,
    pub pct: f64,
}

/// Latest year present anywhere in the table.
pub fn latest_year(rows: &[CleanRow]) -> Option<i32> {
    rows.iter().map(|r| r.year).max()
}

/// Highest values of `indicator` in `year`, descending.
pub fn top_by_value(rows: &[CleanRow], indicator: &str, year: i32, top_n: usize) -> Vec<Ranked> {
    let mut hits: Vec<Ranked> = rows
        .iter()
        .filter(|r| r.indicator_code == indicator && r.year == year)
        .map(|r| Ranked {
            country_code: r.country_code.clone(),
            label: r.country_name_de.clone(),
            value: r.value,
        })
        .collect();
    hits.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(std::cmp::Ordering::Equal));
    hits.truncate(top_n);
    hits
}

/// Percent change of `indicator` between the table's first and last year, per country.
///
/// Countries missing either endpoint, or with a zero start value, are left out.
pub fn relative_change(rows: &[CleanRow], indicator: &str) -> Vec<Change> {
    let series: Vec<&CleanRow> = rows.iter().filter(|r| r.indicator_code == indicator).collect();
    let (Some(first_year), Some(last_year)) = (
        series.iter().map(|r| r.year).min(),
        series.iter().map(|r| r.year).max(),
    ) else {
        return Vec::new();
    };

    let mut ends: BTreeMap<&str, (Option<f64>, Option<f64>, &str)> = BTreeMap::new();
    for r in &series {
        let entry = ends
            .entry(r.country_code.as_str())
            .or_insert((None, None, r.country_name_de.as_str()));
        if r.year == first_year {
            entry.0.get_or_insert(r.value);
        }
        if r.year == last_year {
            entry.1.get_or_insert(r.value);
        }
    }

    ends.into_iter()
        .filter_map(|(code, (start, end, label))| {
            let (start, end) = (start?, end?);
            if start == 0.0 {
                return None;
            }
            let pct = ((end - start) / start * 100.0 * 100.0).round() / 100.0;
            Some(Change {
                country_code: code.to_string(),
                label: label.to_string(),
                first_year,
                last_year,
                pct,
            })
        })
        .collect()
}

/// The standard set of rankings printed after a run.
pub fn standard_rankings(rows: &[CleanRow], top_n: usize) -> Vec<Ranking> {
    let Some(year) = latest_year(rows) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    out.push(Ranking {
        title: format!("Top {top_n} Bevölkerung ({year})"),
        format: ValueFormat::Billions,
        entries: top_by_value(rows, POPULATION, year, top_n),
    });

    let changes = relative_change(rows, POPULATION);
    if let Some(first) = changes.first() {
        let span = format!("{}–{}", first.first_year, first.last_year);
        let mut sorted = changes.clone();
        sorted.sort_by(|a, b| b.pct.partial_cmp(&a.pct).unwrap_or(std::cmp::Ordering::Equal));

        out.push(Ranking {
            title: format!("Top {top_n}: relativer Bevölkerungswandel ({span})"),
            format: ValueFormat::Percent,
            entries: sorted.iter().take(top_n).map(change_entry).collect(),
        });
        out.push(Ranking {
            title: format!("Top {top_n}: geringster Bevölkerungswandel ({span})"),
            format: ValueFormat::Percent,
            entries: sorted.iter().rev().take(top_n).map(change_entry).collect(),
        });
    }

    out.push(Ranking {
        title: format!("Top {top_n} BIP pro Kopf ({year})"),
        format: ValueFormat::Currency,
        entries: top_by_value(rows, GDP_PER_CAPITA_CALC, year, top_n),
    });

    out.retain(|r| !r.entries.is_empty());
    out
}

fn change_entry(c: &Change) -> Ranked {
    Ranked {
        country_code: c.country_code.clone(),
        label: c.label.clone(),
        value: c.pct,
    }
}
