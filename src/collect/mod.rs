//! Collection: fetch raw provider observations and normalize them.
//!
//! Normalization is lenient at the record level (bad rows are dropped) and
//! strict at the run level: any provider failure aborts the whole run so a
//! partial collection never reaches the merge step.

use rayon::prelude::*;
use tracing::{debug, info};

use crate::data::{Provider, RawObservation};
use crate::domain::{
    CollectMode, ObservationRecord, SeriesCatalog, SeriesSpec, YearRange, first_of_month, period_code_for,
};
use crate::error::AppError;

/// Turn raw provider items into observation records.
///
/// Keeps only monthly periods `M01`..`M12`. Items with a missing or
/// unparseable year, period, or value are dropped silently.
pub fn normalize(series_name: &str, series_id: &str, raw_items: &[RawObservation]) -> Vec<ObservationRecord> {
    let mut out = Vec::with_capacity(raw_items.len());
    let mut dropped = 0usize;

    for item in raw_items {
        match normalize_item(series_name, series_id, item) {
            Some(record) => out.push(record),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        debug!(series_id, dropped, "dropped non-monthly or unparseable items");
    }
    out
}

fn normalize_item(series_name: &str, series_id: &str, item: &RawObservation) -> Option<ObservationRecord> {
    let period = item.period.as_deref()?.trim();
    let month = parse_month_code(period)?;
    let year = item.year.as_deref()?.trim().parse::<i32>().ok()?;
    let value = parse_value(item.value.as_deref()?)?;
    let date = first_of_month(year, month)?;

    Some(ObservationRecord {
        series_name: series_name.to_string(),
        series_id: series_id.to_string(),
        date,
        value,
        period_code: period_code_for(date),
        period_label: item.period_name.clone().unwrap_or_default(),
        year,
    })
}

/// `M01`..`M12` → month number. `M13` (annual average) and non-`M` periods
/// such as quarterly `Q01` are rejected, as is anything not exactly two digits.
fn parse_month_code(period: &str) -> Option<u32> {
    let digits = period.strip_prefix('M')?;
    if digits.len() != 2 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let month = digits.parse::<u32>().ok()?;
    (1..=12).contains(&month).then_some(month)
}

fn parse_value(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "-" {
        return None;
    }
    let v = trimmed.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

/// Fetch and normalize every catalog series.
///
/// All-or-nothing: the first provider error is returned and nothing else is
/// kept. Output order follows the catalog in both modes.
pub fn collect_all<P: Provider + ?Sized>(
    provider: &P,
    catalog: &SeriesCatalog,
    years: YearRange,
    mode: CollectMode,
) -> Result<Vec<ObservationRecord>, AppError> {
    let per_series: Vec<Vec<ObservationRecord>> = match mode {
        CollectMode::Sequential => catalog
            .entries()
            .iter()
            .map(|spec| collect_one(provider, spec, years))
            .collect::<Result<_, _>>()?,
        CollectMode::Parallel => catalog
            .entries()
            .par_iter()
            .map(|spec| collect_one(provider, spec, years))
            .collect::<Result<_, _>>()?,
    };

    Ok(per_series.into_iter().flatten().collect())
}

fn collect_one<P: Provider + ?Sized>(
    provider: &P,
    spec: &SeriesSpec,
    years: YearRange,
) -> Result<Vec<ObservationRecord>, AppError> {
    info!(
        series = %spec.display_name,
        series_id = %spec.provider_id,
        "fetching"
    );
    let raw = provider.fetch_series(&spec.provider_id, years.start_year, years.end_year)?;
    let records = normalize(&spec.display_name, &spec.provider_id, &raw);
    info!(
        series_id = %spec.provider_id,
        raw = raw.len(),
        kept = records.len(),
        "normalized"
    );
    Ok(records)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::error::ErrorKind;

    pub(crate) fn raw(year: &str, period: &str, value: &str) -> RawObservation {
        RawObservation {
            year: Some(year.to_string()),
            period: Some(period.to_string()),
            period_name: Some("Month".to_string()),
            value: Some(value.to_string()),
        }
    }

    /// In-memory provider keyed by series id; unknown ids fail like an outage.
    pub(crate) struct FakeProvider {
        pub(crate) data: HashMap<String, Vec<RawObservation>>,
    }

    impl Provider for FakeProvider {
        fn fetch_series(&self, provider_id: &str, _start: i32, _end: i32) -> Result<Vec<RawObservation>, AppError> {
            self.data
                .get(provider_id)
                .cloned()
                .ok_or_else(|| AppError::provider(format!("BLS API error for {provider_id}: unavailable")))
        }
    }

    #[test]
    fn normalize_keeps_only_real_months() {
        let items = vec![
            raw("2024", "M01", "100.5"),
            raw("2024", "M13", "101.0"),
            raw("2024", "Q01", "99.0"),
            raw("2024", "M12", "102.0"),
        ];
        let out = normalize("Test", "T1", &items);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].date, first_of_month(2024, 1).unwrap());
        assert_eq!(out[0].period_code, "M01");
        assert_eq!(out[1].date, first_of_month(2024, 12).unwrap());
        assert_eq!(out[1].year, 2024);
    }

    #[test]
    fn normalize_drops_bad_values_and_years() {
        let mut missing_year = raw("", "M03", "1.0");
        missing_year.year = None;
        let items = vec![
            raw("2024", "M02", "-"),
            raw("2024", "M02", "abc"),
            raw("2024", "M02", "NaN"),
            raw("20x4", "M02", "1.0"),
            missing_year,
            raw("2024", "M00", "1.0"),
            raw("2024", "M04", " 7.25 "),
        ];
        let out = normalize("Test", "T1", &items);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].value, 7.25);
        assert_eq!(out[0].date, first_of_month(2024, 4).unwrap());
    }

    #[test]
    fn malformed_month_codes_are_dropped() {
        let items = vec![
            raw("2024", "M1", "1.0"),
            raw("2024", "M+1", "1.0"),
            raw("2024", "M001", "1.0"),
            raw("2024", "M 1", "1.0"),
            raw("2024", " M05 ", "5.0"),
        ];
        let out = normalize("Test", "T1", &items);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].date, first_of_month(2024, 5).unwrap());
        assert_eq!(out[0].period_code, "M05");
    }

    #[test]
    fn collect_all_aborts_on_any_provider_error() {
        let provider = FakeProvider {
            data: HashMap::from([("A".to_string(), vec![raw("2024", "M01", "1")])]),
        };
        let catalog = SeriesCatalog::new(vec![SeriesSpec::new("a", "A", "u"), SeriesSpec::new("b", "B", "u")]);
        let years = YearRange::new(2024, 2024).unwrap();
        for mode in [CollectMode::Sequential, CollectMode::Parallel] {
            let err = collect_all(&provider, &catalog, years, mode).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Provider);
        }
    }

    #[test]
    fn parallel_matches_sequential_order() {
        let provider = FakeProvider {
            data: HashMap::from([
                ("A".to_string(), vec![raw("2024", "M01", "1"), raw("2024", "M02", "2")]),
                ("B".to_string(), vec![raw("2024", "M01", "3")]),
                ("C".to_string(), vec![raw("2024", "M01", "4")]),
            ]),
        };
        let catalog = SeriesCatalog::new(vec![
            SeriesSpec::new("c", "C", "u"),
            SeriesSpec::new("a", "A", "u"),
            SeriesSpec::new("b", "B", "u"),
        ]);
        let years = YearRange::new(2024, 2024).unwrap();
        let seq = collect_all(&provider, &catalog, years, CollectMode::Sequential).unwrap();
        let par = collect_all(&provider, &catalog, years, CollectMode::Parallel).unwrap();
        assert_eq!(seq, par);
        let ids: Vec<_> = seq.iter().map(|r| r.series_id.as_str()).collect();
        assert_eq!(ids, vec!["C", "A", "A", "B"]);
    }
}
