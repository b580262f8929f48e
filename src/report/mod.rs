//! Reporting utilities: latest-month summary and formatted terminal output.
//!
//! The numbers come from the metrics layer; this module only picks columns
//! and lays them out.

use chrono::NaiveDate;

use crate::metrics::{IndexedView, YoyTable};
use crate::view::SeriesSelection;

pub mod format;

pub use format::*;

/// Level and YoY for one series at the latest visible month.
#[derive(Debug, Clone, PartialEq)]
pub struct LatestEntry {
    pub series_name: String,
    pub value: Option<f64>,
    pub yoy_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LatestSummary {
    pub date: NaiveDate,
    pub entries: Vec<LatestEntry>,
}

/// Latest month shown in `view`, with each selected series' level and YoY
/// looked up in the full table. Series without data that month report `None`.
pub fn latest_summary(full: &YoyTable, view: &IndexedView, selection: &SeriesSelection) -> Option<LatestSummary> {
    let date = view.rows().iter().map(|r| r.row.record.date).max()?;

    let entries = selection
        .names()
        .map(|name| {
            let row = full.get(name, date);
            LatestEntry {
                series_name: name.to_string(),
                value: row.map(|r| r.record.value),
                yoy_pct: row.and_then(|r| r.yoy_pct),
            }
        })
        .collect();

    Some(LatestSummary { date, entries })
}
