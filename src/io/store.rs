//! Persisted store: one flat CSV, one row per observation.
//!
//! Header: `series_name,series_id,date,value,period,periodName,year`.
//!
//! Loading is lenient per row (unparseable date/value rows are dropped and
//! reported), saving is all-or-nothing (temp file + rename).

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{Datelike, NaiveDate};
use csv::StringRecord;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::domain::{ObservationRecord, ObservationTable, period_code_for};
use crate::error::AppError;

const REQUIRED_COLUMNS: [&str; 4] = ["series_name", "series_id", "date", "value"];

/// A row-level problem encountered while loading the store.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Load output: the normalized table plus what was skipped.
#[derive(Debug, Clone)]
pub struct LoadedStore {
    pub table: ObservationTable,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// Load the store, or `Ok(None)` when no file exists yet.
pub fn load_store(path: &Path) -> Result<Option<LoadedStore>, AppError> {
    if !path.exists() {
        return Ok(None);
    }

    let file = File::open(path)
        .map_err(|e| AppError::io(format!("Failed to open store '{}': {e}", path.display())))?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::io(format!("Failed to read store headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    for col in REQUIRED_COLUMNS {
        if !header_map.contains_key(col) {
            return Err(AppError::io(format!(
                "Store '{}' is missing required column: `{col}`",
                path.display()
            )));
        }
    }

    let mut records = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&record, &header_map) {
            Ok(r) => records.push(r),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    if !row_errors.is_empty() {
        warn!(
            path = %path.display(),
            skipped = row_errors.len(),
            "dropped unparseable store rows"
        );
    }

    let table = ObservationTable::from_records(records);
    info!(path = %path.display(), rows = table.len(), "loaded store");

    Ok(Some(LoadedStore {
        table,
        row_errors,
        rows_read,
    }))
}

#[derive(Debug, Serialize)]
struct StoreRow<'a> {
    series_name: &'a str,
    series_id: &'a str,
    date: NaiveDate,
    value: f64,
    period: &'a str,
    #[serde(rename = "periodName")]
    period_name: &'a str,
    year: i32,
}

/// Replace the store with `table`.
///
/// Rows go to a temp file beside the target which is then renamed over it, so
/// a failure part-way leaves the previous snapshot intact.
pub fn save_store(path: &Path, table: &ObservationTable) -> Result<(), AppError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)
        .map_err(|e| AppError::io(format!("Failed to create store dir '{}': {e}", dir.display())))?;

    let tmp = NamedTempFile::new_in(dir)
        .map_err(|e| AppError::io(format!("Failed to create temp file in '{}': {e}", dir.display())))?;

    {
        let mut writer = csv::Writer::from_writer(BufWriter::new(tmp.as_file()));
        for r in table.records() {
            writer
                .serialize(StoreRow {
                    series_name: &r.series_name,
                    series_id: &r.series_id,
                    date: r.date,
                    value: r.value,
                    period: &r.period_code,
                    period_name: &r.period_label,
                    year: r.year,
                })
                .map_err(|e| AppError::io(format!("Failed to write store row: {e}")))?;
        }
        if table.is_empty() {
            // csv only emits the header alongside the first row.
            writer
                .write_record(["series_name", "series_id", "date", "value", "period", "periodName", "year"])
                .map_err(|e| AppError::io(format!("Failed to write store header: {e}")))?;
        }
        writer
            .into_inner()
            .map_err(|e| AppError::io(format!("Failed to flush store: {e}")))?
            .flush()
            .map_err(|e| AppError::io(format!("Failed to flush store: {e}")))?;
    }

    tmp.persist(path)
        .map_err(|e| AppError::io(format!("Failed to replace store '{}': {e}", path.display())))?;

    info!(path = %path.display(), rows = table.len(), "saved store");
    Ok(())
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.trim().trim_start_matches('\u{feff}').to_string(), idx))
        .collect()
}

fn parse_row(record: &StringRecord, header_map: &HashMap<String, usize>) -> Result<ObservationRecord, String> {
    let series_name = get_required(record, header_map, "series_name")?.to_string();
    let series_id = get_required(record, header_map, "series_id")?.to_string();
    let date = parse_date(get_required(record, header_map, "date")?)?;
    let value = parse_value(get_required(record, header_map, "value")?)?;

    let year = get_optional(record, header_map, "year")
        .and_then(|s| s.parse::<i32>().ok())
        .unwrap_or_else(|| date.year());
    let period_code = get_optional(record, header_map, "period")
        .map(str::to_string)
        .unwrap_or_else(|| period_code_for(date));
    let period_label = get_optional(record, header_map, "periodName")
        .map(str::to_string)
        .unwrap_or_default();

    Ok(ObservationRecord {
        series_name,
        series_id,
        date,
        value,
        period_code,
        period_label,
        year,
    })
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    get_optional(record, header_map, name).ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn get_optional<'a>(record: &'a StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}

/// ISO dates, optionally with a time part (older stores were written by a
/// dataframe tool as `2024-01-01 00:00:00`). Always snapped to month start.
fn parse_date(s: &str) -> Result<NaiveDate, String> {
    let date_part = s.split([' ', 'T']).next().unwrap_or(s);
    let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|_| format!("Invalid date '{s}'. Expected YYYY-MM-DD."))?;
    date.with_day(1).ok_or_else(|| format!("Invalid date '{s}'."))
}

fn parse_value(s: &str) -> Result<f64, String> {
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(format!("Invalid value '{s}'.")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::monthly;

    #[test]
    fn missing_file_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_store(&dir.path().join("nope.csv")).unwrap().is_none());
    }

    #[test]
    fn save_then_load_preserves_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("labor_data.csv");
        let mut records = monthly("B", 2024, 11, &[3.5, 3.75, 4.0]);
        records.extend(monthly("A", 2024, 1, &[159_000.0, 159_250.5]));
        let table = ObservationTable::from_records(records);

        save_store(&path, &table).unwrap();
        let loaded = load_store(&path).unwrap().unwrap();

        assert_eq!(loaded.table, table);
        assert!(loaded.row_errors.is_empty());
        assert_eq!(loaded.rows_read, 5);

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("series_name,series_id,date,value,period,periodName,year\n"));
        assert!(text.contains("Series A,A,2024-01-01,159000.0,M01,January,2024"), "{text}");
    }

    #[test]
    fn bad_rows_are_dropped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.csv");
        std::fs::write(
            &path,
            "series_name,series_id,date,value,period,periodName,year\n\
             Rate,R1,2024-01-01,4.0,M01,January,2024\n\
             Rate,R1,not-a-date,4.1,M02,February,2024\n\
             Rate,R1,2024-03-01,n/a,M03,March,2024\n\
             Rate,R1,2024-04-01 00:00:00,4.3,M04,April,\n",
        )
        .unwrap();

        let loaded = load_store(&path).unwrap().unwrap();
        assert_eq!(loaded.rows_read, 4);
        assert_eq!(loaded.row_errors.len(), 2);
        assert_eq!(loaded.row_errors[0].line, 3);
        assert_eq!(loaded.table.len(), 2);
        let april = &loaded.table.records()[1];
        assert_eq!(april.date, NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
        assert_eq!(april.year, 2024);
    }

    #[test]
    fn missing_column_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.csv");
        std::fs::write(&path, "series_name,date,value\nX,2024-01-01,1\n").unwrap();
        assert!(load_store(&path).is_err());
    }
}
