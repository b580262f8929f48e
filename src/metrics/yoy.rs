//! Year-over-year change, computed over the full table.

use std::collections::HashMap;

use chrono::{Months, NaiveDate};

use crate::domain::{ObservationRecord, ObservationTable};

/// One table row plus its YoY change.
#[derive(Debug, Clone, PartialEq)]
pub struct YoyRow {
    pub record: ObservationRecord,
    /// `(value / value 12 months earlier - 1) * 100`, or `None` without a
    /// usable year-ago observation.
    pub yoy_pct: Option<f64>,
}

/// The full table with `yoy_pct` attached. Only [`compute_yoy`] builds one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct YoyTable {
    rows: Vec<YoyRow>,
}

impl YoyTable {
    pub fn rows(&self) -> &[YoyRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.rows.iter().map(|r| r.record.date).max()
    }

    /// Row for one series at one month, by display name.
    pub fn get(&self, series_name: &str, date: NaiveDate) -> Option<&YoyRow> {
        self.rows
            .iter()
            .find(|r| r.record.date == date && r.record.series_name == series_name)
    }

    /// Sorted, de-duplicated series display names.
    pub fn series_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.rows.iter().map(|r| r.record.series_name.clone()).collect();
        names.sort();
        names.dedup();
        names
    }
}

/// Attach `yoy_pct` to every record of the full table.
///
/// The year-ago lookup is by calendar month, not by position, so a gap in a
/// series yields `None` instead of comparing against the wrong month. Must be
/// run before any windowing: the lookback reaches outside whatever window the
/// caller later shows.
pub fn compute_yoy(table: &ObservationTable) -> YoyTable {
    let mut rows = Vec::with_capacity(table.len());

    for run in table.series_runs() {
        let by_date: HashMap<NaiveDate, f64> = run.iter().map(|r| (r.date, r.value)).collect();
        for record in run {
            let yoy_pct = record
                .date
                .checked_sub_months(Months::new(12))
                .and_then(|prior| by_date.get(&prior))
                .and_then(|&prior| pct_change(prior, record.value));
            rows.push(YoyRow {
                record: record.clone(),
                yoy_pct,
            });
        }
    }

    YoyTable { rows }
}

fn pct_change(prior: f64, current: f64) -> Option<f64> {
    if prior == 0.0 {
        return None;
    }
    let pct = (current / prior - 1.0) * 100.0;
    pct.is_finite().then_some(pct)
}
