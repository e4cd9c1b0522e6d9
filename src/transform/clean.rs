//! Row cleaning: coerce → drop incomplete → dedup → localize.
//!
//! Each step is a standalone function so callers (and tests) can compose them;
//! `Cleaner::clean` runs them in order. Row-level defects are never errors,
//! they only reduce the row count.

use std::collections::HashSet;

use tracing::debug;

use crate::domain::{CleanRow, RawRow, YearWindow};
use crate::transform::locale::Localizer;

/// A raw row after numeric coercion; missing stays `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct CoercedRow {
    pub country_code: String,
    pub country_name: Option<String>,
    pub region: Option<String>,
    pub income_level: Option<String>,
    pub indicator_code: Option<String>,
    pub indicator_name: Option<String>,
    pub year: Option<i32>,
    pub value: Option<f64>,
}

pub struct Cleaner<'a> {
    window: YearWindow,
    localizer: &'a Localizer,
}

impl<'a> Cleaner<'a> {
    pub fn new(window: YearWindow, localizer: &'a Localizer) -> Self {
        Self { window, localizer }
    }

    pub fn clean(&self, rows: &[RawRow]) -> Vec<CleanRow> {
        let coerced = coerce_types(rows);
        let complete = drop_incomplete(coerced, self.window);
        let complete_len = complete.len();
        let mut deduped = dedup_first(complete);
        localize_names(&mut deduped, self.localizer);

        debug!(
            input = rows.len(),
            dropped_incomplete = rows.len() - complete_len,
            dropped_duplicates = complete_len - deduped.len(),
            output = deduped.len(),
            "cleaned rows"
        );
        deduped
    }
}

/// Step 1: parse year and value; anything unparsable becomes missing.
pub fn coerce_types(rows: &[RawRow]) -> Vec<CoercedRow> {
    rows.iter()
        .map(|r| CoercedRow {
            country_code: r.country_code.trim().to_string(),
            country_name: r.country_name.clone(),
            region: r.region.clone(),
            income_level: r.income_level.clone(),
            indicator_code: non_empty(r.indicator_code.as_deref()),
            indicator_name: r.indicator_name.clone(),
            year: r.year.as_deref().and_then(parse_year),
            value: r.value.as_deref().and_then(parse_value),
        })
        .collect()
}

/// Step 2: keep rows with all join-critical fields present and the year in `window`.
pub fn drop_incomplete(rows: Vec<CoercedRow>, window: YearWindow) -> Vec<CleanRow> {
    rows.into_iter()
        .filter_map(|r| {
            if r.country_code.is_empty() {
                return None;
            }
            let indicator_code = r.indicator_code?;
            let year = r.year.filter(|y| window.contains(*y))?;
            let value = r.value?;

            let country_name = r.country_name.unwrap_or_else(|| r.country_code.clone());
            Some(CleanRow {
                country_name_de: country_name.clone(),
                country_name,
                region: r.region.unwrap_or_default(),
                income_level: r.income_level.unwrap_or_default(),
                indicator_name: r.indicator_name.unwrap_or_else(|| indicator_code.clone()),
                country_code: r.country_code,
                indicator_code,
                year,
                value,
            })
        })
        .collect()
}

/// Step 3: stable dedup on (country, indicator, year); the first occurrence wins.
pub fn dedup_first(rows: Vec<CleanRow>) -> Vec<CleanRow> {
    let mut seen: HashSet<(String, String, i32)> = HashSet::with_capacity(rows.len());
    rows.into_iter()
        .filter(|r| seen.insert((r.country_code.clone(), r.indicator_code.clone(), r.year)))
        .collect()
}

/// Step 4: set `country_name_de`, falling back to the API name.
pub fn localize_names(rows: &mut [CleanRow], localizer: &Localizer) {
    for row in rows.iter_mut() {
        row.country_name_de = localizer.display_name(&row.country_code, &row.country_name);
    }
}

fn non_empty(s: Option<&str>) -> Option<String> {
    s.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

/// Accepts `"2021"` and integral floats such as `"2021.0"`.
fn parse_year(raw: &str) -> Option<i32> {
    let s = raw.trim();
    if let Ok(y) = s.parse::<i32>() {
        return Some(y);
    }
    let f = s.parse::<f64>().ok()?;
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i32::MAX as f64 {
        Some(f as i32)
    } else {
        None
    }
}

fn parse_value(raw: &str) -> Option<f64> {
    let v = raw.trim().parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(country: &str, indicator: Option<&str>, year: Option<&str>, value: Option<&str>) -> RawRow {
        RawRow {
            country_code: country.to_string(),
            country_name: Some(format!("{country} name")),
            region: Some("Europe & Central Asia".to_string()),
            income_level: Some("High income".to_string()),
            indicator_code: indicator.map(str::to_string),
            indicator_name: indicator.map(|i| format!("{i} name")),
            year: year.map(str::to_string),
            value: value.map(str::to_string),
        }
    }

    fn window() -> YearWindow {
        YearWindow::new(2019, 2023)
    }

    #[test]
    fn coerces_and_drops_unusable_rows() {
        let rows = vec![
            raw("DE", Some("SP.POP.TOTL"), Some("2021"), Some("83000000")),
            raw("DE", Some("SP.POP.TOTL"), Some("2022.0"), Some("83500000.5")),
            raw("DE", Some("SP.POP.TOTL"), Some("n/a"), Some("1")),
            raw("DE", Some("SP.POP.TOTL"), Some("2020"), None),
            raw("DE", Some("SP.POP.TOTL"), Some("2020"), Some("abc")),
            raw("DE", None, Some("2020"), Some("1")),
            raw("", Some("SP.POP.TOTL"), Some("2020"), Some("1")),
            raw("DE", Some("SP.POP.TOTL"), Some("1990"), Some("1")),
        ];
        let out = Cleaner::new(window(), &Localizer::empty()).clean(&rows);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].year, 2021);
        assert_eq!(out[1].year, 2022);
        assert_eq!(out[1].value, 83_500_000.5);
    }

    #[test]
    fn dedup_keeps_first_seen() {
        let rows = vec![
            raw("FR", Some("SP.POP.TOTL"), Some("2021"), Some("1")),
            raw("DE", Some("SP.POP.TOTL"), Some("2021"), Some("2")),
            raw("FR", Some("SP.POP.TOTL"), Some("2021"), Some("3")),
            raw("FR", Some("NY.GDP.MKTP.CD"), Some("2021"), Some("4")),
        ];
        let out = Cleaner::new(window(), &Localizer::empty()).clean(&rows);
        let values: Vec<f64> = out.iter().map(|r| r.value).collect();
        assert_eq!(values, vec![1.0, 2.0, 4.0]);

        let keys: HashSet<_> = out.iter().map(|r| r.key()).collect();
        assert_eq!(keys.len(), out.len());
    }

    #[test]
    fn localizes_with_fallback() {
        let rows = vec![
            raw("DE", Some("SP.POP.TOTL"), Some("2021"), Some("1")),
            raw("JG", Some("SP.POP.TOTL"), Some("2021"), Some("1")),
        ];
        let out = Cleaner::new(window(), &Localizer::german()).clean(&rows);
        assert_eq!(out[0].country_name_de, "Deutschland");
        assert_eq!(out[1].country_name_de, "JG name");
    }

    #[test]
    fn cleaning_is_idempotent() {
        let rows = vec![
            raw("DE", Some("SP.POP.TOTL"), Some("2021"), Some("83000000")),
            raw("DE", Some("SP.POP.TOTL"), Some("2021"), Some("1")),
            raw("FR", Some("SP.POP.TOTL"), Some("2022"), Some("0.1")),
            raw("FR", Some("SP.POP.TOTL"), None, Some("5")),
        ];
        let localizer = Localizer::german();
        let cleaner = Cleaner::new(window(), &localizer);

        let once = cleaner.clean(&rows);
        let again_input: Vec<RawRow> = once.iter().map(RawRow::from).collect();
        let twice = cleaner.clean(&again_input);
        assert_eq!(once, twice);
    }
}
