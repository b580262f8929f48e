//! Derived metrics.
//!
//! The two columns have different scopes and therefore different input types:
//!
//! - `yoy_pct` needs the full history (`ObservationTable` → `YoyTable`)
//! - `indexed_100` is rebased on whatever is visible (`WindowedView` → `IndexedView`)
//!
//! Neither is persisted.

pub mod indexed;
pub mod yoy;

pub use indexed::{IndexedRow, IndexedView, compute_indexed};
pub use yoy::{YoyRow, YoyTable, compute_yoy};
