//! Storage-side retention: cap how many months each series keeps.

use crate::domain::{DEFAULT_RETENTION, ObservationTable};

/// Keep only the latest `max_records_per_series` records of every series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub max_records_per_series: usize,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_records_per_series: DEFAULT_RETENTION,
        }
    }
}

impl RetentionPolicy {
    pub fn new(max_records_per_series: usize) -> Self {
        Self {
            max_records_per_series,
        }
    }

    /// Apply the cap. Returns the trimmed table and how many records fell off.
    pub fn apply(&self, table: ObservationTable) -> (ObservationTable, usize) {
        let before = table.len();
        let keep = self.max_records_per_series;

        let mut kept = Vec::with_capacity(before);
        for run in table.series_runs() {
            let skip = run.len().saturating_sub(keep);
            kept.extend(run[skip..].iter().cloned());
        }

        let dropped = before - kept.len();
        (ObservationTable::from_records(kept), dropped)
    }
}
