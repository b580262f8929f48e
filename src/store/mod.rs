//! Store merging: fold a fresh collection into the persisted snapshot.
//!
//! The merge is a pure function of `(existing, incoming, retention)`; writing
//! the result is left to `io::store` so the two can be tested apart.

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::info;

use crate::domain::{ObservationRecord, ObservationTable};
use crate::error::AppError;

pub mod retention;

pub use retention::RetentionPolicy;

/// What a merge did, for logging and the CLI summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub existing: usize,
    pub incoming: usize,
    /// Incoming records that replaced a stored month with a different value.
    pub revised: usize,
    pub dropped_by_retention: usize,
    pub total: usize,
}

/// Merge newly collected records into the existing table.
///
/// Incoming records win over stored ones for the same `(series_id, date)`.
/// An empty collection is rejected so it can never wipe history.
pub fn merge(
    existing: Option<ObservationTable>,
    incoming: Vec<ObservationRecord>,
    retention: RetentionPolicy,
) -> Result<(ObservationTable, MergeSummary), AppError> {
    if incoming.is_empty() {
        return Err(AppError::collection("No records collected from provider."));
    }

    let existing = existing.unwrap_or_default();
    let mut summary = MergeSummary {
        existing: existing.len(),
        incoming: incoming.len(),
        ..MergeSummary::default()
    };

    summary.revised = count_revisions(&existing, &incoming);

    let combined = existing.into_records().into_iter().chain(incoming);
    let (table, dropped) = retention.apply(ObservationTable::from_records(combined));

    summary.dropped_by_retention = dropped;
    summary.total = table.len();

    info!(
        existing = summary.existing,
        incoming = summary.incoming,
        revised = summary.revised,
        dropped = summary.dropped_by_retention,
        total = summary.total,
        "merged store"
    );

    Ok((table, summary))
}

fn count_revisions(existing: &ObservationTable, incoming: &[ObservationRecord]) -> usize {
    let stored: HashMap<(&str, NaiveDate), f64> =
        existing.records().iter().map(|r| (r.key(), r.value)).collect();
    incoming
        .iter()
        .filter(|r| stored.get(&r.key()).is_some_and(|v| *v != r.value))
        .count()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::{first_of_month, period_code_for};
    use crate::error::ErrorKind;

    /// Consecutive monthly records for one series starting at `year-month`.
    pub(crate) fn monthly(series_id: &str, year: i32, month: u32, values: &[f64]) -> Vec<ObservationRecord> {
        let start = first_of_month(year, month).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, &value)| {
                let date = start + chrono::Months::new(i as u32);
                ObservationRecord {
                    series_name: format!("Series {series_id}"),
                    series_id: series_id.to_string(),
                    date,
                    value,
                    period_code: period_code_for(date),
                    period_label: date.format("%B").to_string(),
                    year: chrono::Datelike::year(&date),
                }
            })
            .collect()
    }

    fn at(series_id: &str, year: i32, month: u32, value: f64) -> ObservationRecord {
        monthly(series_id, year, month, &[value]).remove(0)
    }

    #[test]
    fn later_arrival_wins_on_duplicate_key() {
        let existing = ObservationTable::from_records(monthly("A", 2024, 1, &[1.0, 2.0, 3.0]));
        let incoming = vec![at("A", 2024, 2, 20.0), at("A", 2024, 4, 4.0)];

        let (table, summary) = merge(Some(existing), incoming, RetentionPolicy::default()).unwrap();

        assert_eq!(table.len(), 4);
        let feb = first_of_month(2024, 2).unwrap();
        let matches: Vec<_> = table.records().iter().filter(|r| r.date == feb).collect();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].value, 20.0);
        assert_eq!(summary.revised, 1);
        assert_eq!(summary.total, 4);
    }

    #[test]
    fn duplicates_within_incoming_keep_last() {
        let incoming = vec![at("A", 2024, 1, 1.0), at("A", 2024, 1, 5.0)];
        let (table, _) = merge(None, incoming, RetentionPolicy::default()).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.records()[0].value, 5.0);
    }

    #[test]
    fn retention_applies_after_merge() {
        let existing = ObservationTable::from_records(monthly("A", 2022, 1, &[1.0; 20]));
        let incoming = monthly("A", 2023, 9, &[2.0; 10]);

        let (table, summary) = merge(Some(existing), incoming, RetentionPolicy::new(24)).unwrap();

        assert_eq!(table.count_for("A"), 24);
        assert_eq!(summary.dropped_by_retention, 6);
        let first = &table.records()[0];
        // 2022-01 .. 2024-06 is 30 months; the 24 latest start at 2022-07.
        assert_eq!(first.date, first_of_month(2022, 7).unwrap());
        assert!(table.records().windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn empty_collection_is_rejected() {
        let existing = ObservationTable::from_records(monthly("A", 2024, 1, &[1.0]));
        let err = merge(Some(existing), Vec::new(), RetentionPolicy::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Collection);
    }
}
