//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and installs logging
//! - turns arguments (and `.env`) into explicit config values
//! - dispatches to the shared pipeline
//! - prints reports and writes exports

use std::time::Duration;

use chrono::{Datelike, Local};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{CatalogArgs, CollectArgs, Command, ExportArgs, ShowArgs, StoreArgs, ViewArgs};
use crate::data::BlsClient;
use crate::domain::{CollectMode, PipelineConfig, ProviderConfig, SeriesCatalog, YearRange};
use crate::error::AppError;
use crate::metrics::YoyTable;
use crate::view::SeriesSelection;

pub mod pipeline;

/// Entry point for the `pulse` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();
    init_tracing();

    match cli.command {
        Command::Collect(args) => handle_collect(args),
        Command::Show(args) => handle_show(args),
        Command::Export(args) => handle_export(args),
        Command::Series(args) => handle_series(args),
    }
}

/// `RUST_LOG` wins; otherwise `info`. Logs go to stderr so tables on stdout
/// stay pipeable.
fn init_tracing() {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle_collect(args: CollectArgs) -> Result<(), AppError> {
    let catalog = load_catalog(args.store.catalog.as_deref())?;
    let config = pipeline_config_from_args(&args, Local::now().year())?;
    let client = BlsClient::new(&config.provider)?;

    let out = pipeline::run_collect(&client, &catalog, &config)?;
    println!(
        "{}",
        crate::report::format_merge_summary(&out.summary, &config.store_path)
    );
    Ok(())
}

fn handle_show(args: ShowArgs) -> Result<(), AppError> {
    let (catalog, full, selection) = prepare_view(&args.view)?;
    let view = pipeline::build_view(&full, args.view.window, &selection);

    println!("{}", crate::report::format_view_header(&view.windowed));
    if view.windowed.is_empty() {
        println!("No data for the selected filters.");
        return Ok(());
    }

    println!();
    print!(
        "{}",
        crate::report::format_view_table(&view.indexed, args.mode, &catalog)
    );
    if let Some(summary) = crate::report::latest_summary(&full, &view.indexed, &selection) {
        print!("{}", crate::report::format_latest(&summary));
    }
    Ok(())
}

fn handle_export(args: ExportArgs) -> Result<(), AppError> {
    let (_, full, selection) = prepare_view(&args.view)?;
    let view = pipeline::build_view(&full, args.view.window, &selection);

    if view.windowed.is_empty() {
        return Err(AppError::config("No data for the selected filters; nothing to export."));
    }

    crate::io::write_view_csv(&args.out, &view.indexed)?;
    info!(path = %args.out.display(), rows = view.indexed.len(), "exported view");
    println!("Wrote {} rows to {}", view.indexed.len(), args.out.display());
    Ok(())
}

fn handle_series(args: CatalogArgs) -> Result<(), AppError> {
    let catalog = load_catalog(args.catalog.as_deref())?;
    print!("{}", crate::report::format_catalog(&catalog));
    Ok(())
}

fn prepare_view(args: &ViewArgs) -> Result<(SeriesCatalog, YoyTable, SeriesSelection), AppError> {
    let StoreArgs { store, catalog } = &args.store;
    let catalog = load_catalog(catalog.as_deref())?;
    let full = pipeline::load_table(store)?;

    // No explicit selection means every series present in the store.
    let names = if args.series.is_empty() {
        full.series_names()
    } else {
        args.series.clone()
    };
    let selection = SeriesSelection::new(names)?;

    Ok((catalog, full, selection))
}

fn load_catalog(path: Option<&std::path::Path>) -> Result<SeriesCatalog, AppError> {
    match path {
        Some(p) => crate::io::read_catalog_json(p),
        None => Ok(SeriesCatalog::bls_labor_default()),
    }
}

/// Build the collection config from CLI args, the environment, and "now".
pub fn pipeline_config_from_args(args: &CollectArgs, current_year: i32) -> Result<PipelineConfig, AppError> {
    dotenvy::dotenv().ok();
    let api_key = std::env::var("BLS_API_KEY").ok().filter(|k| !k.trim().is_empty());

    if args.retention == 0 {
        return Err(AppError::config("`--retention` must be at least 1."));
    }
    if args.timeout_secs == 0 {
        return Err(AppError::config("`--timeout-secs` must be at least 1."));
    }

    let end_year = args.end_year.unwrap_or(current_year);
    let years = match args.start_year {
        Some(start) => YearRange::new(start, end_year).map_err(AppError::config)?,
        None => YearRange::trailing(end_year, args.lookback_years).map_err(AppError::config)?,
    };

    Ok(PipelineConfig {
        store_path: args.store.store.clone(),
        retention: args.retention,
        years,
        mode: if args.parallel {
            CollectMode::Parallel
        } else {
            CollectMode::Sequential
        },
        provider: ProviderConfig {
            base_url: args.base_url.clone(),
            timeout: Duration::from_secs(args.timeout_secs),
            api_key,
        },
    })
}
