//! View-side filtering: time window + series selection.
//!
//! This is independent of storage retention. Retention decides what is kept
//! on disk; the window decides what a consumer sees of it.

use std::collections::BTreeSet;

use chrono::{Months, NaiveDate};

use crate::domain::TimeWindow;
use crate::error::AppError;
use crate::metrics::{YoyRow, YoyTable};

/// Non-empty set of series display names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesSelection {
    names: BTreeSet<String>,
}

impl SeriesSelection {
    /// Fails with an empty-selection error when `names` is empty.
    pub fn new(names: impl IntoIterator<Item = String>) -> Result<Self, AppError> {
        let names: BTreeSet<String> = names
            .into_iter()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();
        if names.is_empty() {
            return Err(AppError::empty_selection());
        }
        Ok(Self { names })
    }

    pub fn contains(&self, series_name: &str) -> bool {
        self.names.contains(series_name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// A filtered slice of a [`YoyTable`]. Only [`select`] builds one.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowedView {
    rows: Vec<YoyRow>,
    window: TimeWindow,
    cutoff: Option<NaiveDate>,
}

impl WindowedView {
    pub fn rows(&self) -> &[YoyRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn window(&self) -> TimeWindow {
        self.window
    }

    /// First visible month for `LastMonths`; `None` for all-time.
    pub fn cutoff(&self) -> Option<NaiveDate> {
        self.cutoff
    }

    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.rows.iter().map(|r| r.record.date).max()
    }
}

/// Cutoff for a window, measured back from the table's latest month.
pub fn window_cutoff(latest: NaiveDate, window: TimeWindow) -> Option<NaiveDate> {
    match window {
        TimeWindow::AllTime => None,
        TimeWindow::LastMonths(n) => latest.checked_sub_months(Months::new(n)),
    }
}

/// Apply a time window and series selection to the full derived table.
///
/// The cutoff is measured from the latest date across the whole table, not
/// just the selected series. `yoy_pct` values are carried over untouched; a
/// narrow window simply shows fewer of them. An empty result is valid.
pub fn select(table: &YoyTable, window: TimeWindow, selection: &SeriesSelection) -> WindowedView {
    let cutoff = table.latest_date().and_then(|latest| window_cutoff(latest, window));

    let rows = table
        .rows()
        .iter()
        .filter(|r| cutoff.is_none_or(|c| r.record.date >= c))
        .filter(|r| selection.contains(&r.record.series_name))
        .cloned()
        .collect();

    WindowedView { rows, window, cutoff }
}
