//! Input/output helpers.
//!
//! - persisted observation store (`store`)
//! - catalog JSON (`catalog`)
//! - filtered view export (`export`)

pub mod catalog;
pub mod export;
pub mod store;

pub use catalog::*;
pub use export::*;
pub use store::*;
