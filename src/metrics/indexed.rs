//! Index-to-100 over a filtered view.

use crate::metrics::yoy::YoyRow;
use crate::view::WindowedView;

/// A visible row with both derived columns.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedRow {
    pub row: YoyRow,
    /// `value / first visible value * 100`; `None` when the base is zero.
    pub indexed_100: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexedView {
    rows: Vec<IndexedRow>,
}

impl IndexedView {
    pub fn rows(&self) -> &[IndexedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Rebase each visible series so its first visible month is 100.
///
/// The base depends on the window, so this only accepts a [`WindowedView`]
/// and must be recomputed whenever the selection changes.
pub fn compute_indexed(view: &WindowedView) -> IndexedView {
    let mut rows = Vec::with_capacity(view.len());

    for run in view.rows().chunk_by(|a, b| a.record.series_id == b.record.series_id) {
        let base = run[0].record.value;
        for row in run {
            let indexed_100 = if base == 0.0 {
                None
            } else {
                let v = row.record.value / base * 100.0;
                v.is_finite().then_some(v)
            };
            rows.push(IndexedRow {
                row: row.clone(),
                indexed_100,
            });
        }
    }

    IndexedView { rows }
}
