//! The ETL run shared by the `run` command and tests.
//!
//! resolve countries -> fetch + normalize -> raw CSV -> clean -> derive
//! -> validate -> clean CSV + SQLite
//!
//! Transport failures abort the run; everything else is absorbed by omission.

use tracing::{info, warn};

use crate::data::{HttpTransport, Pager, Transport, fetch_indicator_rows, resolve_entities};
use crate::domain::{CleanRow, EntityMap, PipelineConfig, RawRow};
use crate::error::AppError;
use crate::io::{LoadSummary, load, schema_ddl, write_clean_csv, write_raw_csv};
use crate::quality::{ValidationReport, validate};
use crate::transform::{Cleaner, Localizer, add_derived};

/// All outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub entities: EntityMap,
    pub raw_rows: usize,
    pub clean: Vec<CleanRow>,
    pub derived_rows: usize,
    pub checks: ValidationReport,
    pub load: LoadSummary,
}

/// Run the full pipeline against the live API.
pub fn run_pipeline(config: &PipelineConfig) -> Result<RunOutput, AppError> {
    let transport = HttpTransport::new(config.timeout)?;
    run_pipeline_with(config, &transport)
}

/// Run the full pipeline over an arbitrary transport.
pub fn run_pipeline_with(config: &PipelineConfig, transport: &dyn Transport) -> Result<RunOutput, AppError> {
    let pager = Pager::from_config(transport, config);

    // 1) Reference data.
    let entities = resolve_entities(&pager)?;

    // 2) Indicator observations, joined against the resolved countries.
    let raw = fetch_indicator_rows(&pager, &config.indicators, config.window, &entities)?;
    write_raw_csv(&config.raw_csv, &raw)?;

    // 3) Clean + derive.
    let localizer = Localizer::german();
    let (clean, derived_rows) = build_clean_table(&raw, config, &localizer);

    // 4) Advisory checks.
    let checks = validate(&clean, config.window);
    if !checks.all_passed() {
        warn!(failed = ?checks.failed(), "quality checks failed");
    }

    // 5) Persist; both sinks read the same clean table.
    write_clean_csv(&config.clean_csv, &clean)?;
    let ddl = schema_ddl(config.schema_path.as_deref())?;
    let load_summary = load(&config.sqlite_db, &ddl, &clean)?;

    Ok(RunOutput {
        entities,
        raw_rows: raw.len(),
        clean,
        derived_rows,
        checks,
        load: load_summary,
    })
}

/// Clean raw rows and append derived indicators; returns the table and the derived row count.
pub fn build_clean_table(raw: &[RawRow], config: &PipelineConfig, localizer: &Localizer) -> (Vec<CleanRow>, usize) {
    let cleaned = Cleaner::new(config.window, localizer).clean(raw);
    let base = cleaned.len();
    let clean = add_derived(cleaned, &config.derived);
    let derived_rows = clean.len() - base;

    info!(raw = raw.len(), clean = base, derived = derived_rows, "built clean table");
    (clean, derived_rows)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rusqlite::Connection;
    use serde_json::{Value, json};

    use super::*;
    use crate::data::fetch::tests::FakeTransport;
    use crate::domain::{GDP_CURRENT_USD, GDP_PER_CAPITA_CALC, POPULATION, SourceIndicator, YearWindow};
    use crate::quality::VALUES_NON_NEGATIVE;

    const BASE: &str = "http://api.test/v2";

    fn obs(country: &str, name: &str, indicator: &str, year: &str, value: Value) -> Value {
        json!({
            "indicator": {"id": indicator, "value": indicator},
            "country": {"id": country, "value": name},
            "date": year,
            "value": value
        })
    }

    fn transport() -> FakeTransport {
        FakeTransport::default()
            .with(
                &format!("{BASE}/country"),
                1,
                json!([{"pages": 1}, [
                    {"id": "DEU", "iso2Code": "DE", "name": "Germany",
                     "region": {"value": "Europe & Central Asia"}, "incomeLevel": {"value": "High income"}},
                    {"id": "IND", "iso2Code": "IN", "name": "India",
                     "region": {"value": "South Asia"}, "incomeLevel": {"value": "Lower middle income"}},
                    {"id": "WLD", "iso2Code": "1W", "name": "World",
                     "region": {"value": "Aggregates"}, "incomeLevel": {"value": "Aggregates"}}
                ]]),
            )
            .with(
                &format!("{BASE}/country/all/indicator/{POPULATION}"),
                1,
                json!([{"pages": 2}, [
                    obs("DE", "Germany", POPULATION, "2022", json!(84_000_000)),
                    obs("1W", "World", POPULATION, "2022", json!(7_950_000_000_u64)),
                    obs("IN", "India", POPULATION, "2022", json!(1_417_000_000_u64)),
                ]]),
            )
            .with(
                &format!("{BASE}/country/all/indicator/{POPULATION}"),
                2,
                json!([{"pages": 2}, [
                    obs("DE", "Germany", POPULATION, "2021", json!(83_000_000)),
                    obs("DE", "Germany", POPULATION, "2022", json!(1)),
                ]]),
            )
            .with(
                &format!("{BASE}/country/all/indicator/{GDP_CURRENT_USD}"),
                1,
                json!([{"pages": 1}, [
                    obs("DE", "Germany", GDP_CURRENT_USD, "2022", json!(4_200_000_000_000_u64)),
                    obs("IN", "India", GDP_CURRENT_USD, "2022", Value::Null),
                ]]),
            )
    }

    fn config(dir: &std::path::Path) -> PipelineConfig {
        let mut config = PipelineConfig::with_window(YearWindow::new(2018, 2022));
        config.base_url = BASE.to_string();
        config.request_delay = Duration::ZERO;
        config.indicators = vec![
            SourceIndicator::new(POPULATION, "Population"),
            SourceIndicator::new(GDP_CURRENT_USD, "GDP (current US$)"),
        ];
        config.raw_csv = dir.join("raw/worldbank_raw.csv");
        config.clean_csv = dir.join("processed/worldbank_clean.csv");
        config.sqlite_db = dir.join("processed/worldbank.db");
        config
    }

    #[test]
    fn end_to_end_over_fake_transport() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());

        let run = run_pipeline_with(&config, &transport()).unwrap();

        assert_eq!(run.entities.len(), 2);
        // World dropped by the join; the duplicate and the null GDP survive until cleaning.
        assert_eq!(run.raw_rows, 6);
        // DE 2022 duplicate dropped, IN GDP null dropped, one derived row added.
        assert_eq!(run.derived_rows, 1);
        assert_eq!(run.clean.len(), 5);
        assert!(run.checks.all_passed());

        let derived: Vec<&CleanRow> = run.clean.iter().filter(|r| r.indicator_code == GDP_PER_CAPITA_CALC).collect();
        assert_eq!(derived.len(), 1);
        assert_eq!(derived[0].country_code, "DE");
        assert_eq!(derived[0].value, 50_000.0);
        assert_eq!(derived[0].country_name_de, "Deutschland");

        assert!(config.raw_csv.exists());
        assert_eq!(crate::io::read_clean_csv(&config.clean_csv).unwrap(), run.clean);

        let conn = Connection::open(&config.sqlite_db).unwrap();
        let facts: i64 = conn.query_row("SELECT COUNT(*) FROM facts", [], |r| r.get(0)).unwrap();
        assert_eq!(facts, 5);
        assert_eq!(run.load.countries, 2);
        assert_eq!(run.load.indicators, 3);
    }

    #[test]
    fn transport_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let mut t = transport();
        t.fail_on = Some((format!("{BASE}/country/all/indicator/{POPULATION}"), 2));

        let err = run_pipeline_with(&config, &t).unwrap_err();
        assert_eq!(err.exit_code(), 4);
        assert!(!config.clean_csv.exists());
    }

    #[test]
    fn checks_are_advisory() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let t = FakeTransport::default()
            .with(
                &format!("{BASE}/country"),
                1,
                json!([{"pages": 1}, [
                    {"id": "DEU", "iso2Code": "DE", "name": "Germany",
                     "region": {"value": "Europe & Central Asia"}, "incomeLevel": {"value": "High income"}}
                ]]),
            )
            .with(
                &format!("{BASE}/country/all/indicator/{POPULATION}"),
                1,
                json!([{"pages": 1}, [obs("DE", "Germany", POPULATION, "2022", json!(-3))]]),
            );

        let run = run_pipeline_with(&config, &t).unwrap();
        assert_eq!(run.checks.get(VALUES_NON_NEGATIVE), Some(false));
        assert_eq!(run.load.facts, 1);
    }
}
