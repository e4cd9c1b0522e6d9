//! Plausibility checks over the clean table.
//!
//! Every rule is evaluated on its own and only reported; a failing rule never
//! stops the pipeline or changes the data.

use std::collections::HashSet;

use crate::domain::{CleanRow, YearWindow};

pub const NO_MISSING_COUNTRY: &str = "no_missing_country";
pub const YEAR_IN_RANGE: &str = "year_in_range";
pub const VALUES_NON_NEGATIVE: &str = "values_non_negative";
pub const NO_DUPLICATES: &str = "no_duplicates";

/// Named pass/fail results in rule order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    checks: Vec<(&'static str, bool)>,
}

impl ValidationReport {
    pub fn get(&self, rule: &str) -> Option<bool> {
        self.checks.iter().find(|(name, _)| *name == rule).map(|(_, ok)| *ok)
    }

    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|(_, ok)| *ok)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, bool)> + '_ {
        self.checks.iter().copied()
    }

    pub fn failed(&self) -> Vec<&'static str> {
        self.checks.iter().filter(|(_, ok)| !ok).map(|(name, _)| *name).collect()
    }
}

pub fn validate(rows: &[CleanRow], window: YearWindow) -> ValidationReport {
    ValidationReport {
        checks: vec![
            (NO_MISSING_COUNTRY, no_missing_country(rows)),
            (YEAR_IN_RANGE, year_in_range(rows, window)),
            (VALUES_NON_NEGATIVE, values_non_negative(rows)),
            (NO_DUPLICATES, no_duplicates(rows)),
        ],
    }
}

fn no_missing_country(rows: &[CleanRow]) -> bool {
    rows.iter().all(|r| !r.country_code.trim().is_empty())
}

fn year_in_range(rows: &[CleanRow], window: YearWindow) -> bool {
    rows.iter().all(|r| window.contains(r.year))
}

// NaN fails the comparison and therefore the rule.
fn values_non_negative(rows: &[CleanRow]) -> bool {
    rows.iter().all(|r| r.value >= 0.0)
}

fn no_duplicates(rows: &[CleanRow]) -> bool {
    let mut seen = HashSet::with_capacity(rows.len());
    rows.iter().all(|r| seen.insert(r.key()))
}
