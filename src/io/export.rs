//! Export a filtered view to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::error::AppError;
use crate::metrics::IndexedView;

const HEADER: [&str; 8] = [
    "series_name",
    "month",
    "value",
    "yoy_pct",
    "indexed_100",
    "periodName",
    "year",
    "series_id",
];

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    series_name: &'a str,
    month: String,
    value: f64,
    yoy_pct: Option<f64>,
    indexed_100: Option<f64>,
    #[serde(rename = "periodName")]
    period_name: &'a str,
    year: i32,
    series_id: &'a str,
}

/// Write the visible rows with both derived columns.
///
/// Rows are ordered by series name then month. Metrics are rounded to four
/// decimals; missing ones are empty cells.
pub fn write_view_csv(path: &Path, view: &IndexedView) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create export CSV '{}': {e}", path.display())))?;
    let mut writer = csv::Writer::from_writer(BufWriter::new(file));

    let mut rows: Vec<_> = view.rows().iter().collect();
    rows.sort_by(|a, b| {
        (&a.row.record.series_name, a.row.record.date).cmp(&(&b.row.record.series_name, b.row.record.date))
    });

    for r in &rows {
        let rec = &r.row.record;
        writer
            .serialize(ExportRow {
                series_name: &rec.series_name,
                month: rec.month_label(),
                value: rec.value,
                yoy_pct: r.row.yoy_pct.map(round4),
                indexed_100: r.indexed_100.map(round4),
                period_name: &rec.period_label,
                year: rec.year,
                series_id: &rec.series_id,
            })
            .map_err(|e| AppError::io(format!("Failed to write export CSV row: {e}")))?;
    }
    if rows.is_empty() {
        writer
            .write_record(HEADER)
            .map_err(|e| AppError::io(format!("Failed to write export CSV header: {e}")))?;
    }

    writer
        .into_inner()
        .map_err(|e| AppError::io(format!("Failed to flush export CSV: {e}")))?
        .flush()
        .map_err(|e| AppError::io(format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

fn round4(v: f64) -> f64 {
    (v * 1e4).round() / 1e4
}
