//! Upstream data providers.

pub mod bls;

pub use bls::{BlsClient, Provider, RawObservation};
