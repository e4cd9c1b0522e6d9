//! SQLite store: `countries`, `indicators`, `facts`.
//!
//! The store is rebuilt from scratch on every run (file deleted, schema
//! re-applied, all rows inserted). It is not an append/merge target.
//!
//! Natural keys (ISO2 code, indicator code) are inserted first so SQLite
//! assigns surrogate ids; facts are then joined against the ids read back.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use rusqlite::{Connection, params};
use tracing::{info, warn};

use crate::domain::CleanRow;
use crate::error::AppError;
use crate::io::flatfile::ensure_parent;

/// DDL shipped with the crate (`sql/schema.sql`).
pub const BUNDLED_SCHEMA: &str = include_str!("../../sql/schema.sql");

/// Row counts after a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadSummary {
    pub countries: usize,
    pub indicators: usize,
    pub facts: usize,
    /// Clean rows whose country or indicator had no surrogate id.
    pub excluded: usize,
}

/// Read the DDL from `path`, or use the bundled schema.
pub fn schema_ddl(path: Option<&Path>) -> Result<String, AppError> {
    match path {
        Some(p) => fs::read_to_string(p)
            .map_err(|e| AppError::new(2, format!("Failed to read schema '{}': {e}", p.display()))),
        None => Ok(BUNDLED_SCHEMA.to_string()),
    }
}

/// Delete `db_path` if present, recreate it from `ddl`, and load `rows`.
pub fn load(db_path: &Path, ddl: &str, rows: &[CleanRow]) -> Result<LoadSummary, AppError> {
    if db_path.exists() {
        fs::remove_file(db_path)
            .map_err(|e| AppError::new(5, format!("Failed to remove old database '{}': {e}", db_path.display())))?;
    }
    ensure_parent(db_path)?;

    let mut conn = Connection::open(db_path)
        .map_err(|e| AppError::new(5, format!("Failed to open database '{}': {e}", db_path.display())))?;
    let summary = load_into(&mut conn, ddl, rows)?;

    info!(
        path = %db_path.display(),
        countries = summary.countries,
        indicators = summary.indicators,
        facts = summary.facts,
        "loaded SQLite store"
    );
    Ok(summary)
}

/// Apply `ddl` to an empty connection and load `rows` in one transaction.
pub fn load_into(conn: &mut Connection, ddl: &str, rows: &[CleanRow]) -> Result<LoadSummary, AppError> {
    conn.execute_batch(ddl)
        .map_err(|e| AppError::new(5, format!("Failed to apply schema: {e}")))?;

    let tx = conn
        .transaction()
        .map_err(|e| AppError::new(5, format!("Failed to begin transaction: {e}")))?;

    let countries = distinct_by(rows, |r| r.country_code.as_str());
    {
        let mut stmt = tx
            .prepare("INSERT INTO countries (iso2, name, region, income_level) VALUES (?1, ?2, ?3, ?4)")
            .map_err(|e| AppError::new(5, format!("Failed to prepare country insert: {e}")))?;
        for r in &countries {
            stmt.execute(params![r.country_code, r.country_name_de, r.region, r.income_level])
                .map_err(|e| AppError::new(5, format!("Failed to insert country {}: {e}", r.country_code)))?;
        }
    }

    let indicators = distinct_by(rows, |r| r.indicator_code.as_str());
    {
        let mut stmt = tx
            .prepare("INSERT INTO indicators (code, name) VALUES (?1, ?2)")
            .map_err(|e| AppError::new(5, format!("Failed to prepare indicator insert: {e}")))?;
        for r in &indicators {
            stmt.execute(params![r.indicator_code, r.indicator_name])
                .map_err(|e| AppError::new(5, format!("Failed to insert indicator {}: {e}", r.indicator_code)))?;
        }
    }

    let country_ids = read_ids(&tx, "SELECT id, iso2 FROM countries")?;
    let indicator_ids = read_ids(&tx, "SELECT id, code FROM indicators")?;

    let mut facts = 0usize;
    let mut excluded = 0usize;
    {
        let mut stmt = tx
            .prepare("INSERT INTO facts (country_id, indicator_id, year, value) VALUES (?1, ?2, ?3, ?4)")
            .map_err(|e| AppError::new(5, format!("Failed to prepare fact insert: {e}")))?;
        for r in rows {
            let (Some(country_id), Some(indicator_id)) =
                (country_ids.get(&r.country_code), indicator_ids.get(&r.indicator_code))
            else {
                excluded += 1;
                continue;
            };
            stmt.execute(params![country_id, indicator_id, r.year, r.value])
                .map_err(|e| {
                    AppError::new(
                        5,
                        format!("Failed to insert fact ({}, {}, {}): {e}", r.country_code, r.indicator_code, r.year),
                    )
                })?;
            facts += 1;
        }
    }

    tx.commit()
        .map_err(|e| AppError::new(5, format!("Failed to commit load: {e}")))?;

    if excluded > 0 {
        warn!(excluded, "fact rows excluded: unresolved country or indicator id");
    }

    Ok(LoadSummary {
        countries: countries.len(),
        indicators: indicators.len(),
        facts,
        excluded,
    })
}

/// First row per key, in first-seen order.
fn distinct_by<'a>(rows: &'a [CleanRow], key: impl Fn(&CleanRow) -> &str) -> Vec<&'a CleanRow> {
    let mut seen = std::collections::HashSet::new();
    rows.iter().filter(|r| seen.insert(key(r).to_string())).collect()
}

/// `natural key -> surrogate id` from a two-column `SELECT id, key` query.
fn read_ids(conn: &Connection, sql: &str) -> Result<HashMap<String, i64>, AppError> {
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| AppError::new(5, format!("Failed to prepare `{sql}`: {e}")))?;
    let pairs = stmt
        .query_map([], |row| Ok((row.get::<_, String>(1)?, row.get::<_, i64>(0)?)))
        .map_err(|e| AppError::new(5, format!("Failed to run `{sql}`: {e}")))?;

    let mut ids = HashMap::new();
    for pair in pairs {
        let (key, id) = pair.map_err(|e| AppError::new(5, format!("Failed to read id row: {e}")))?;
        ids.insert(key, id);
    }
    Ok(ids)
}
