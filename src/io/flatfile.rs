//! CSV snapshots of the raw and clean tables.
//!
//! The clean CSV is the hand-off to downstream consumers; its header is exactly
//! `CLEAN_COLUMNS`. Files are overwritten on every run.

use std::fs::{self, File};
use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::domain::{CleanRow, RawRow};
use crate::error::AppError;

pub fn write_raw_csv(path: &Path, rows: &[RawRow]) -> Result<(), AppError> {
    write_rows(path, rows, &RAW_COLUMNS)
}

pub fn write_clean_csv(path: &Path, rows: &[CleanRow]) -> Result<(), AppError> {
    write_rows(path, rows, &crate::domain::CLEAN_COLUMNS)
}

const RAW_COLUMNS: [&str; 8] = [
    "country_code",
    "country_name",
    "region",
    "income_level",
    "indicator_code",
    "indicator_name",
    "year",
    "value",
];

fn write_rows<T: Serialize>(path: &Path, rows: &[T], header: &[&str]) -> Result<(), AppError> {
    ensure_parent(path)?;
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create CSV '{}': {e}", path.display())))?;

    // Header is written explicitly so an empty table still yields the column set.
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
    writer
        .write_record(header)
        .map_err(|e| AppError::new(2, format!("Failed to write CSV header: {e}")))?;
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| AppError::new(2, format!("Failed to write CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush CSV '{}': {e}", path.display())))?;

    info!(path = %path.display(), rows = rows.len(), "wrote CSV");
    Ok(())
}

/// Read a clean CSV back, skipping rows that fail to parse.
///
/// Readers re-clean defensively: blank join keys and non-finite values are dropped too.
pub fn read_clean_csv(path: &Path) -> Result<Vec<CleanRow>, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open clean CSV '{}': {e}", path.display())))?;

    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for result in reader.deserialize::<CleanRow>() {
        match result {
            Ok(row)
                if !row.country_code.is_empty()
                    && !row.indicator_code.is_empty()
                    && row.value.is_finite() =>
            {
                rows.push(row)
            }
            Ok(_) | Err(_) => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!(path = %path.display(), skipped, "skipped unusable rows in clean CSV");
    }
    Ok(rows)
}

pub(crate) fn ensure_parent(path: &Path) -> Result<(), AppError> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir)
            .map_err(|e| AppError::new(2, format!("Failed to create directory '{}': {e}", dir.display()))),
        _ => Ok(()),
    }
}
