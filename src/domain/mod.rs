//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the observation record and the full observation table
//! - the series catalog (display name → provider id + unit)
//! - run configuration (`PipelineConfig`, `YearRange`, `TimeWindow`, `ViewMode`)

pub mod types;

pub use types::*;
