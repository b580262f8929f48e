//! Shared pipeline logic used by every CLI command.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! collect -> merge -> save, and load -> yoy -> select -> index.
//!
//! The provider is injected, so the whole flow runs against fixtures in tests.

use std::path::Path;

use tracing::info;

use crate::collect::collect_all;
use crate::data::Provider;
use crate::domain::{ObservationTable, PipelineConfig, SeriesCatalog, TimeWindow};
use crate::error::AppError;
use crate::io::{load_store, save_store};
use crate::metrics::{IndexedView, YoyTable, compute_indexed, compute_yoy};
use crate::store::{MergeSummary, RetentionPolicy, merge};
use crate::view::{SeriesSelection, WindowedView, select};

/// Outcome of one collection run.
#[derive(Debug, Clone)]
pub struct CollectOutput {
    pub table: ObservationTable,
    pub summary: MergeSummary,
}

/// Fetch every catalog series, merge into the store, and replace it.
///
/// Any provider or collection failure returns before the store is touched.
pub fn run_collect<P: Provider + ?Sized>(
    provider: &P,
    catalog: &SeriesCatalog,
    config: &PipelineConfig,
) -> Result<CollectOutput, AppError> {
    info!(
        series = catalog.len(),
        start_year = config.years.start_year,
        end_year = config.years.end_year,
        mode = ?config.mode,
        "collection run"
    );

    let incoming = collect_all(provider, catalog, config.years, config.mode)?;
    let existing = load_store(&config.store_path)?.map(|loaded| loaded.table);
    let (table, summary) = merge(existing, incoming, RetentionPolicy::new(config.retention))?;

    save_store(&config.store_path, &table)?;

    Ok(CollectOutput { table, summary })
}

/// Load the store and attach YoY over its full history.
pub fn load_table(store_path: &Path) -> Result<YoyTable, AppError> {
    let loaded = load_store(store_path)?.ok_or_else(|| {
        AppError::io(format!(
            "No data found at '{}'. Run `pulse collect` first.",
            store_path.display()
        ))
    })?;
    Ok(compute_yoy(&loaded.table))
}

/// A filtered view plus its indexed form.
#[derive(Debug, Clone)]
pub struct ViewOutput {
    pub windowed: WindowedView,
    pub indexed: IndexedView,
}

/// Window + select on the full table, then index the visible subset.
pub fn build_view(full: &YoyTable, window: TimeWindow, selection: &SeriesSelection) -> ViewOutput {
    let windowed = select(full, window, selection);
    let indexed = compute_indexed(&windowed);
    ViewOutput { windowed, indexed }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;

    use super::*;
    use crate::collect::tests::{FakeProvider, raw};
    use crate::domain::{CollectMode, ProviderConfig, SeriesSpec, YearRange, first_of_month};
    use crate::error::ErrorKind;

    fn config(store_path: PathBuf) -> PipelineConfig {
        PipelineConfig {
            store_path,
            retention: 24,
            years: YearRange::new(2024, 2025).unwrap(),
            mode: CollectMode::Sequential,
            provider: ProviderConfig::default(),
        }
    }

    fn catalog() -> SeriesCatalog {
        SeriesCatalog::new(vec![SeriesSpec::new("Unemployment Rate", "LNS14000000", "Percent")])
    }

    #[test]
    fn revision_across_runs_replaces_month_without_double_count() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path().join("labor_data.csv"));

        let run1 = FakeProvider {
            data: HashMap::from([(
                "LNS14000000".to_string(),
                vec![raw("2024", "M01", "3.7"), raw("2024", "M02", "3.9"), raw("2024", "M03", "3.8")],
            )]),
        };
        let out1 = run_collect(&run1, &catalog(), &cfg).unwrap();
        assert_eq!(out1.table.count_for("LNS14000000"), 3);

        // Run 2 revises March and adds April.
        let run2 = FakeProvider {
            data: HashMap::from([(
                "LNS14000000".to_string(),
                vec![raw("2024", "M03", "3.85"), raw("2024", "M04", "3.9"), raw("2024", "M13", "3.8")],
            )]),
        };
        let out2 = run_collect(&run2, &catalog(), &cfg).unwrap();
        assert_eq!(out2.summary.revised, 1);

        let full = load_table(&cfg.store_path).unwrap();
        assert_eq!(full.len(), 4);
        let march = full.get("Unemployment Rate", first_of_month(2024, 3).unwrap()).unwrap();
        assert_eq!(march.record.value, 3.85);
    }

    #[test]
    fn provider_failure_leaves_store_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path().join("labor_data.csv"));
        let good = FakeProvider {
            data: HashMap::from([("LNS14000000".to_string(), vec![raw("2024", "M01", "3.7")])]),
        };
        run_collect(&good, &catalog(), &cfg).unwrap();
        let before = std::fs::read_to_string(&cfg.store_path).unwrap();

        let two = SeriesCatalog::new(vec![
            SeriesSpec::new("Unemployment Rate", "LNS14000000", "Percent"),
            SeriesSpec::new("Missing", "NOPE", "Other"),
        ]);
        let err = run_collect(&good, &two, &cfg).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Provider);
        assert_eq!(std::fs::read_to_string(&cfg.store_path).unwrap(), before);
    }

    #[test]
    fn empty_collection_leaves_store_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path().join("labor_data.csv"));
        let annual_only = FakeProvider {
            data: HashMap::from([("LNS14000000".to_string(), vec![raw("2024", "M13", "3.7")])]),
        };
        let err = run_collect(&annual_only, &catalog(), &cfg).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Collection);
        assert!(!cfg.store_path.exists());
    }

    #[test]
    fn view_keeps_yoy_and_rebases_index() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path().join("labor_data.csv"));
        let months: Vec<(&str, String, String)> = (1..=12)
            .map(|m| ("2024", format!("M{m:02}"), format!("{}", 99 + m)))
            .chain(std::iter::once(("2025", "M01".to_string(), "112".to_string())))
            .collect();
        let provider = FakeProvider {
            data: HashMap::from([(
                "LNS14000000".to_string(),
                months.iter().map(|(y, p, v)| raw(y, p, v)).collect(),
            )]),
        };
        run_collect(&provider, &catalog(), &cfg).unwrap();

        let full = load_table(&cfg.store_path).unwrap();
        let sel = SeriesSelection::new(vec!["Unemployment Rate".to_string()]).unwrap();
        let view = build_view(&full, TimeWindow::LastMonths(1), &sel);

        assert_eq!(view.windowed.len(), 2);
        let last = view.indexed.rows().last().unwrap();
        assert!((last.row.yoy_pct.unwrap() - 12.0).abs() < 1e-9);
        assert_eq!(view.indexed.rows()[0].indexed_100, Some(100.0));
    }

    #[test]
    fn load_without_store_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_table(&dir.path().join("missing.csv")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
