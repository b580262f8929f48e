//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - produced by the collector and merged into the persisted store
//! - reloaded later for metric computation and views
//! - described by a user-supplied catalog file

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Default BLS v2 timeseries endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.bls.gov/publicAPI/v2/timeseries/data";

/// Default number of most-recent records kept per series in the store.
pub const DEFAULT_RETENTION: usize = 24;

/// Default view lookback in months. The cutoff is inclusive, so 14 months show.
pub const DEFAULT_WINDOW_MONTHS: u32 = 13;

/// Unit reported for series the catalog doesn't know.
pub const UNKNOWN_UNIT: &str = "Other";

/// One monthly data point for one series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    pub series_name: String,
    pub series_id: String,
    /// Always the first day of the month.
    pub date: NaiveDate,
    pub value: f64,
    /// Provider period code, `M01`..`M12`.
    pub period_code: String,
    /// Human month name, e.g. `January`.
    pub period_label: String,
    pub year: i32,
}

impl ObservationRecord {
    /// Identity key: at most one record per series per month.
    pub fn key(&self) -> (&str, NaiveDate) {
        (self.series_id.as_str(), self.date)
    }

    /// `YYYY-MM` label used in tables and exports.
    pub fn month_label(&self) -> String {
        self.date.format("%Y-%m").to_string()
    }
}

/// First day of the given month, if it's a real calendar month.
pub fn first_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
}

/// Provider-style period code for a date (`M01`..`M12`).
pub fn period_code_for(date: NaiveDate) -> String {
    format!("M{:02}", date.month())
}

/// Catalog entry mapping a display name to a provider id and display unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesSpec {
    pub display_name: String,
    pub provider_id: String,
    pub unit_label: String,
}

impl SeriesSpec {
    pub fn new(display_name: &str, provider_id: &str, unit_label: &str) -> Self {
        Self {
            display_name: display_name.to_string(),
            provider_id: provider_id.to_string(),
            unit_label: unit_label.to_string(),
        }
    }
}

/// Ordered registry of tracked series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeriesCatalog {
    entries: Vec<SeriesSpec>,
}

impl SeriesCatalog {
    pub fn new(entries: Vec<SeriesSpec>) -> Self {
        Self { entries }
    }

    /// The six BLS labor-market series tracked by default.
    pub fn bls_labor_default() -> Self {
        Self::new(vec![
            SeriesSpec::new("Total Nonfarm Employment", "CES0000000001", "Employment (thousands)"),
            SeriesSpec::new("Unemployment Rate", "LNS14000000", "Percent"),
            SeriesSpec::new("Labor Force Participation Rate", "LNS11300000", "Percent"),
            SeriesSpec::new(
                "Average Hourly Earnings for Private Employees",
                "CES0500000003",
                "Dollars",
            ),
            SeriesSpec::new("Manufacturing Employment", "CES3000000001", "Employment (thousands)"),
            SeriesSpec::new(
                "Education and Health Services Employment",
                "CES6500000001",
                "Employment (thousands)",
            ),
        ])
    }

    pub fn entries(&self) -> &[SeriesSpec] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Unit label for a series display name, falling back to `Other`.
    pub fn unit_for(&self, series_name: &str) -> &str {
        self.entries
            .iter()
            .find(|s| s.display_name == series_name)
            .map(|s| s.unit_label.as_str())
            .unwrap_or(UNKNOWN_UNIT)
    }
}

/// Full observation table.
///
/// Invariants: unique on `(series_id, date)` and sorted by `(series_id, date)`
/// ascending. The only way in is [`ObservationTable::from_records`], which
/// enforces both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationTable {
    records: Vec<ObservationRecord>,
}

impl ObservationTable {
    /// Build a table from records in arrival order.
    ///
    /// Duplicate keys resolve to the last record seen.
    pub fn from_records(records: impl IntoIterator<Item = ObservationRecord>) -> Self {
        let mut by_key: BTreeMap<(String, NaiveDate), ObservationRecord> = BTreeMap::new();
        for record in records {
            by_key.insert((record.series_id.clone(), record.date), record);
        }
        Self {
            records: by_key.into_values().collect(),
        }
    }

    pub fn records(&self) -> &[ObservationRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<ObservationRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Latest observed month across every series.
    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.records.iter().map(|r| r.date).max()
    }

    /// Number of records held for one series.
    pub fn count_for(&self, series_id: &str) -> usize {
        self.records.iter().filter(|r| r.series_id == series_id).count()
    }

    /// Contiguous per-series runs, in `series_id` order.
    pub fn series_runs(&self) -> impl Iterator<Item = &[ObservationRecord]> {
        self.records.chunk_by(|a, b| a.series_id == b.series_id)
    }
}

/// Inclusive calendar-year range requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    pub start_year: i32,
    pub end_year: i32,
}

impl YearRange {
    pub fn new(start_year: i32, end_year: i32) -> Result<Self, String> {
        if start_year > end_year {
            return Err(format!(
                "Invalid year range: start year {start_year} is after end year {end_year}."
            ));
        }
        Ok(Self {
            start_year,
            end_year,
        })
    }

    /// `end_year - lookback ..= end_year`.
    pub fn trailing(end_year: i32, lookback_years: u32) -> Result<Self, String> {
        let start_year = i32::try_from(lookback_years)
            .ok()
            .and_then(|lookback| end_year.checked_sub(lookback))
            .ok_or_else(|| format!("Invalid lookback: {lookback_years} years before {end_year} is out of range."))?;
        Self::new(start_year, end_year)
    }
}

/// How per-series fetches are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollectMode {
    #[default]
    Sequential,
    /// Fetch every series on the rayon pool; results are still reassembled
    /// in catalog order.
    Parallel,
}

/// Upstream provider settings.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub api_key: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            api_key: None,
        }
    }
}

/// Everything a collection run needs, passed in explicitly.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub store_path: PathBuf,
    pub retention: usize,
    pub years: YearRange,
    pub mode: CollectMode,
    pub provider: ProviderConfig,
}

/// Which records of the table are visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeWindow {
    /// Records on or after `(latest date in table) - n months`.
    LastMonths(u32),
    AllTime,
}

impl Default for TimeWindow {
    fn default() -> Self {
        TimeWindow::LastMonths(DEFAULT_WINDOW_MONTHS)
    }
}

impl FromStr for TimeWindow {
    type Err = String;

    /// Accepts `all`, `13`, or `13m`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(TimeWindow::AllTime);
        }
        let digits = s.strip_suffix(['m', 'M']).unwrap_or(s);
        digits
            .parse::<u32>()
            .map(TimeWindow::LastMonths)
            .map_err(|_| format!("Invalid time window '{s}'. Expected `all` or a month count like `13`."))
    }
}

impl TimeWindow {
    /// Human label, e.g. `last 13 months`.
    pub fn describe(&self) -> String {
        match self {
            TimeWindow::LastMonths(n) => format!("last {n} months"),
            TimeWindow::AllTime => "all data".to_string(),
        }
    }
}

/// Round-trips through `FromStr` (`13m`, `all`).
impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeWindow::LastMonths(n) => write!(f, "{n}m"),
            TimeWindow::AllTime => write!(f, "all"),
        }
    }
}

/// Which value column a table shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// Original values.
    Levels,
    /// Year-over-year change (%).
    Yoy,
    /// Rebased so the first visible month is 100.
    Indexed,
}

impl ViewMode {
    pub fn column_label(self) -> &'static str {
        match self {
            ViewMode::Levels => "value",
            ViewMode::Yoy => "yoy_pct",
            ViewMode::Indexed => "indexed_100",
        }
    }
}
