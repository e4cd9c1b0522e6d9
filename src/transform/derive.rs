//! Derived indicators computed from pairs of source indicators.
//!
//! Two phases over an explicit `(country, year)` index:
//!
//! 1. pivot the long table into `WideTable` (first value wins)
//! 2. for each configured ratio, compute `numerator / denominator` per key and
//!    re-expand the results into long-format rows
//!
//! Adding a derived indicator is a config change (`DerivedIndicator`), not code.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::debug;

use crate::domain::{CleanRow, DerivedIndicator};

/// `(country_code, year) -> {indicator_code: value}`.
#[derive(Debug, Default)]
pub struct WideTable {
    cells: BTreeMap<(String, i32), HashMap<String, f64>>,
    indicators: HashSet<String>,
}

impl WideTable {
    pub fn pivot(rows: &[CleanRow]) -> Self {
        let mut table = WideTable::default();
        for r in rows {
            table
                .cells
                .entry((r.country_code.clone(), r.year))
                .or_default()
                .entry(r.indicator_code.clone())
                .or_insert(r.value);
            table.indicators.insert(r.indicator_code.clone());
        }
        table
    }

    pub fn has_indicator(&self, code: &str) -> bool {
        self.indicators.contains(code)
    }

    pub fn get(&self, country: &str, year: i32, indicator: &str) -> Option<f64> {
        self.cells
            .get(&(country.to_string(), year))
            .and_then(|cols| cols.get(indicator))
            .copied()
    }

    /// Ratio per key; keys with a missing input, zero denominator, or non-finite result are skipped.
    pub fn ratio(&self, numerator: &str, denominator: &str) -> Vec<((&str, i32), f64)> {
        self.cells
            .iter()
            .filter_map(|((country, year), cols)| {
                let num = cols.get(numerator)?;
                let den = cols.get(denominator)?;
                if *den == 0.0 {
                    return None;
                }
                let v = num / den;
                v.is_finite().then_some(((country.as_str(), *year), v))
            })
            .collect()
    }
}

/// Append derived rows for every ratio whose inputs are both present.
pub fn add_derived(rows: Vec<CleanRow>, derived: &[DerivedIndicator]) -> Vec<CleanRow> {
    let wide = WideTable::pivot(&rows);

    // One representative row per country carries the display attributes.
    let mut meta: HashMap<&str, &CleanRow> = HashMap::new();
    for r in &rows {
        meta.entry(r.country_code.as_str()).or_insert(r);
    }

    let mut extra = Vec::new();
    for d in derived {
        if !(wide.has_indicator(&d.numerator) && wide.has_indicator(&d.denominator)) {
            debug!(derived = %d.code, "inputs not present, skipping");
            continue;
        }

        let before = extra.len();
        let values = wide.ratio(&d.numerator, &d.denominator);
        for ((country, year), value) in values {
            let Some(base) = meta.get(country) else {
                continue;
            };
            extra.push(CleanRow {
                country_code: base.country_code.clone(),
                country_name: base.country_name.clone(),
                country_name_de: base.country_name_de.clone(),
                region: base.region.clone(),
                income_level: base.income_level.clone(),
                indicator_code: d.code.clone(),
                indicator_name: d.name.clone(),
                year,
                value,
            });
        }
        debug!(derived = %d.code, rows = extra.len() - before, "computed derived indicator");
    }

    let mut out = rows;
    out.extend(extra);
    out
}
