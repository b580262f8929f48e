//! Command-line parsing for the labor statistics pipeline.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! collection and metrics code. Arguments are turned into explicit config
//! values in `app`; nothing below this layer reads argv or the environment.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{DEFAULT_BASE_URL, DEFAULT_RETENTION, TimeWindow, ViewMode};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "pulse", version, about = "U.S. labor market series: collect, store, and derive YoY / indexed views (BLS)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch every catalog series from BLS and merge it into the store.
    Collect(CollectArgs),
    /// Print a filtered view (levels, YoY, or indexed) and the latest month.
    Show(ShowArgs),
    /// Write a filtered view with both derived columns to CSV.
    Export(ExportArgs),
    /// List the series catalog.
    Series(CatalogArgs),
}

/// Options shared by every command that touches the store or catalog.
#[derive(Debug, Args, Clone)]
pub struct StoreArgs {
    /// Path of the persisted observation store.
    #[arg(long, default_value = "data/labor_data.csv")]
    pub store: PathBuf,

    /// Series catalog JSON (array of {display_name, provider_id, unit_label}).
    /// Defaults to the built-in BLS labor series.
    #[arg(long, value_name = "JSON")]
    pub catalog: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct CatalogArgs {
    /// Series catalog JSON. Defaults to the built-in BLS labor series.
    #[arg(long, value_name = "JSON")]
    pub catalog: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct CollectArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// First year to request. Defaults to end year minus `--lookback-years`.
    #[arg(long)]
    pub start_year: Option<i32>,

    /// Last year to request. Defaults to the current year.
    #[arg(long)]
    pub end_year: Option<i32>,

    /// Years of history to request when `--start-year` is not given.
    #[arg(long, default_value_t = 2)]
    pub lookback_years: u32,

    /// Most-recent records kept per series after merging.
    #[arg(long, default_value_t = DEFAULT_RETENTION)]
    pub retention: usize,

    /// Fetch series concurrently.
    #[arg(long)]
    pub parallel: bool,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// BLS timeseries endpoint.
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,
}

/// Filter options for a view.
#[derive(Debug, Args, Clone)]
pub struct ViewArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Time window: `all` or a month count back from the latest month (e.g. `13`).
    #[arg(short = 'w', long, default_value_t = TimeWindow::default(), value_parser = parse_window)]
    pub window: TimeWindow,

    /// Series to include, by display name (repeatable). Defaults to every series in the store.
    #[arg(short = 's', long = "series")]
    pub series: Vec<String>,
}

#[derive(Debug, Args, Clone)]
pub struct ShowArgs {
    #[command(flatten)]
    pub view: ViewArgs,

    /// Which column to print.
    #[arg(long, value_enum, default_value_t = ViewMode::Levels)]
    pub mode: ViewMode,
}

#[derive(Debug, Args, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub view: ViewArgs,

    /// Output CSV path.
    #[arg(short = 'o', long)]
    pub out: PathBuf,
}

fn parse_window(s: &str) -> Result<TimeWindow, String> {
    s.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_show_with_filters() {
        let cli = Cli::parse_from([
            "pulse",
            "show",
            "--window",
            "all",
            "-s",
            "Unemployment Rate",
            "-s",
            "Labor Force Participation Rate",
            "--mode",
            "yoy",
        ]);
        let Command::Show(args) = cli.command else {
            panic!("expected show");
        };
        assert_eq!(args.view.window, TimeWindow::AllTime);
        assert_eq!(args.view.series.len(), 2);
        assert_eq!(args.mode, ViewMode::Yoy);
        assert_eq!(args.view.store.store, PathBuf::from("data/labor_data.csv"));
    }

    #[test]
    fn collect_defaults() {
        let cli = Cli::parse_from(["pulse", "collect"]);
        let Command::Collect(args) = cli.command else {
            panic!("expected collect");
        };
        assert_eq!(args.retention, 24);
        assert_eq!(args.lookback_years, 2);
        assert!(!args.parallel);
        assert_eq!(args.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn bad_window_is_rejected() {
        assert!(Cli::try_parse_from(["pulse", "show", "--window", "forever"]).is_err());
    }
}
