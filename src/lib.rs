//! `labor-pulse` library crate.
//!
//! The binary (`pulse`) is a thin wrapper around this library so that:
//!
//! - the collect/merge/metrics pipeline is testable without spawning processes
//! - the query surface (full YoY table, `select`, `compute_indexed`) can be
//!   reused by another presentation layer

pub mod app;
pub mod cli;
pub mod collect;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod metrics;
pub mod report;
pub mod store;
pub mod view;
