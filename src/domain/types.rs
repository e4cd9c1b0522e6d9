//! Shared domain types.
//!
//! These types are passed between pipeline stages in-memory. The row types
//! (`RawRow`, `CleanRow`) are also serializable so they can be:
//!
//! - written to the raw/clean CSV files
//! - read back for `report` / `check`

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Region value the API uses for aggregate pseudo-countries ("World", "Euro area", ...).
pub const AGGREGATES_REGION: &str = "Aggregates";

pub const DEFAULT_BASE_URL: &str = "https://api.worldbank.org/v2";
pub const DEFAULT_PAGE_SIZE: usize = 20_000;
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(100);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const POPULATION: &str = "SP.POP.TOTL";
pub const GDP_CURRENT_USD: &str = "NY.GDP.MKTP.CD";
pub const LIFE_EXPECTANCY: &str = "SP.DYN.LE00.IN";
pub const GDP_PER_CAPITA_CALC: &str = "GDP.PER.CAP.CALC";

/// A country/territory from the reference catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityInfo {
    /// ISO2 code (natural key).
    pub code: String,
    /// ISO3 code.
    pub secondary_code: Option<String>,
    pub name: Option<String>,
    pub region: String,
    pub income_level: String,
}

/// Resolved entities keyed by ISO2 code.
pub type EntityMap = BTreeMap<String, EntityInfo>;

/// An indicator fetched from the remote API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceIndicator {
    pub code: String,
    pub name: String,
}

impl SourceIndicator {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }

    pub fn defaults() -> Vec<SourceIndicator> {
        vec![
            SourceIndicator::new(POPULATION, "Population"),
            SourceIndicator::new(GDP_CURRENT_USD, "GDP (current US$)"),
            SourceIndicator::new(LIFE_EXPECTANCY, "Life expectancy (years)"),
        ]
    }
}

/// An indicator computed locally as `numerator / denominator` per (country, year).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedIndicator {
    pub code: String,
    pub name: String,
    pub numerator: String,
    pub denominator: String,
}

impl DerivedIndicator {
    pub fn ratio(
        code: impl Into<String>,
        name: impl Into<String>,
        numerator: impl Into<String>,
        denominator: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            numerator: numerator.into(),
            denominator: denominator.into(),
        }
    }

    pub fn defaults() -> Vec<DerivedIndicator> {
        vec![DerivedIndicator::ratio(
            GDP_PER_CAPITA_CALC,
            "GDP per capita (calc)",
            GDP_CURRENT_USD,
            POPULATION,
        )]
    }
}

/// Inclusive year range used for retrieval and validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearWindow {
    pub start: i32,
    pub end: i32,
}

impl YearWindow {
    pub fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    /// Five-year window ending the year before `current_year`.
    pub fn trailing(current_year: i32) -> Self {
        let end = current_year - 1;
        Self { start: end - 4, end }
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.start..=self.end).contains(&year)
    }

    /// API `date` parameter (`START:END`).
    pub fn as_query(&self) -> String {
        format!("{}:{}", self.start, self.end)
    }
}

/// A normalized but not yet type-coerced observation.
///
/// Only the country code is guaranteed (the normalizer joins on it); all other
/// fields are carried as text so the cleaner decides what is usable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    pub country_code: String,
    pub country_name: Option<String>,
    pub region: Option<String>,
    pub income_level: Option<String>,
    pub indicator_code: Option<String>,
    pub indicator_name: Option<String>,
    pub year: Option<String>,
    pub value: Option<String>,
}

/// One observation of the clean table.
///
/// Field order is the column order of the clean CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanRow {
    pub country_code: String,
    pub country_name: String,
    pub country_name_de: String,
    pub region: String,
    pub income_level: String,
    pub indicator_code: String,
    pub indicator_name: String,
    pub year: i32,
    pub value: f64,
}

impl CleanRow {
    /// Natural key: (country, indicator, year).
    pub fn key(&self) -> (&str, &str, i32) {
        (&self.country_code, &self.indicator_code, self.year)
    }
}

impl From<&CleanRow> for RawRow {
    fn from(row: &CleanRow) -> Self {
        RawRow {
            country_code: row.country_code.clone(),
            country_name: Some(row.country_name.clone()),
            region: Some(row.region.clone()),
            income_level: Some(row.income_level.clone()),
            indicator_code: Some(row.indicator_code.clone()),
            indicator_name: Some(row.indicator_name.clone()),
            year: Some(row.year.to_string()),
            value: Some(row.value.to_string()),
        }
    }
}

/// Column order of the clean CSV (downstream consumers rely on it).
pub const CLEAN_COLUMNS: [&str; 9] = [
    "country_code",
    "country_name",
    "country_name_de",
    "region",
    "income_level",
    "indicator_code",
    "indicator_name",
    "year",
    "value",
];

/// Full configuration for one pipeline run.
///
/// Built once from CLI args and passed by reference to each stage.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub base_url: String,
    pub window: YearWindow,
    pub indicators: Vec<SourceIndicator>,
    pub derived: Vec<DerivedIndicator>,

    pub page_size: usize,
    /// Delay before every follow-up request (pages 2..N and the next indicator).
    pub request_delay: Duration,
    pub timeout: Duration,

    pub raw_csv: PathBuf,
    pub clean_csv: PathBuf,
    pub sqlite_db: PathBuf,
    /// External DDL script; the bundled schema is used when `None`.
    pub schema_path: Option<PathBuf>,

    pub report: bool,
    pub top_n: usize,
    pub chart_width: usize,
}

impl PipelineConfig {
    pub fn with_window(window: YearWindow) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            window,
            indicators: SourceIndicator::defaults(),
            derived: DerivedIndicator::defaults(),
            page_size: DEFAULT_PAGE_SIZE,
            request_delay: DEFAULT_REQUEST_DELAY,
            timeout: DEFAULT_TIMEOUT,
            raw_csv: PathBuf::from("data/raw/worldbank_raw.csv"),
            clean_csv: PathBuf::from("data/processed/worldbank_clean.csv"),
            sqlite_db: PathBuf::from("data/processed/worldbank.db"),
            schema_path: None,
            report: true,
            top_n: 10,
            chart_width: 40,
        }
    }
}
