//! Plain-text formatting for the terminal.
//!
//! We keep formatting code in one place so the pipeline stays free of
//! presentation concerns and output changes are localized.

use std::collections::BTreeMap;
use std::path::Path;

use crate::domain::{SeriesCatalog, ViewMode};
use crate::metrics::{IndexedRow, IndexedView};
use crate::report::LatestSummary;
use crate::store::MergeSummary;
use crate::view::WindowedView;

/// One-paragraph summary of a collection run.
pub fn format_merge_summary(summary: &MergeSummary, path: &Path) -> String {
    format!(
        "Saved {} rows to {} (existing={}, incoming={}, revised={}, trimmed={})",
        summary.total,
        path.display(),
        summary.existing,
        summary.incoming,
        summary.revised,
        summary.dropped_by_retention,
    )
}

pub fn format_catalog(catalog: &SeriesCatalog) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:<48} {:<16} {}\n", "series", "provider_id", "unit"));
    out.push_str(&format!("{:-<48} {:-<16} {:-<24}\n", "", "", ""));
    for spec in catalog.entries() {
        out.push_str(&format!(
            "{:<48} {:<16} {}\n",
            spec.display_name, spec.provider_id, spec.unit_label
        ));
    }
    out
}

/// Header line describing what the view covers.
pub fn format_view_header(view: &WindowedView) -> String {
    match (view.cutoff(), view.latest_date()) {
        (Some(cutoff), Some(latest)) => format!(
            "Window: {} ({} .. {}), {} rows",
            view.window().describe(),
            cutoff.format("%Y-%m"),
            latest.format("%Y-%m"),
            view.len()
        ),
        _ => format!("Window: {}, {} rows", view.window().describe(), view.len()),
    }
}

/// Latest-month levels and YoY, one line per selected series.
pub fn format_latest(summary: &LatestSummary) -> String {
    let mut out = format!("Latest month shown: {}\n", summary.date.format("%Y-%m"));
    for e in &summary.entries {
        let level = e.value.map(fmt_thousands).unwrap_or_else(|| "N/A".to_string());
        let delta = match (e.value, e.yoy_pct) {
            (Some(_), Some(y)) => format!("  {y:+.2}% vs. 12 months ago"),
            _ => String::new(),
        };
        out.push_str(&format!("  {:<48} {:>14}{delta}\n", e.series_name, level));
    }
    out
}

/// Visible rows grouped by display unit, showing the column for `mode`.
///
/// In YoY mode rows without a year-ago value are skipped; if none remain the
/// group says so instead of printing an empty table.
pub fn format_view_table(view: &IndexedView, mode: ViewMode, catalog: &SeriesCatalog) -> String {
    let mut groups: BTreeMap<String, Vec<&IndexedRow>> = BTreeMap::new();
    for r in view.rows() {
        let unit = match mode {
            ViewMode::Levels => catalog.unit_for(&r.row.record.series_name).to_string(),
            ViewMode::Yoy => "Percent (YoY)".to_string(),
            ViewMode::Indexed => "Index (first visible month = 100)".to_string(),
        };
        groups.entry(unit).or_default().push(r);
    }

    let mut out = String::new();
    for (unit, rows) in groups {
        out.push_str(&format!("[{unit}]\n"));
        let shown: Vec<(&IndexedRow, f64)> = rows
            .into_iter()
            .filter_map(|r| column_value(r, mode).map(|v| (r, v)))
            .collect();

        if shown.is_empty() {
            out.push_str("  (not enough history for this view in the selected window)\n\n");
            continue;
        }

        out.push_str(&format!("  {:<48} {:<8} {:>14}\n", "series", "month", mode.column_label()));
        out.push_str(&format!("  {:-<48} {:-<8} {:->14}\n", "", "", ""));
        for (r, v) in shown {
            out.push_str(&format!(
                "  {:<48} {:<8} {:>14.2}\n",
                r.row.record.series_name,
                r.row.record.month_label(),
                v
            ));
        }
        out.push('\n');
    }
    out
}

fn column_value(r: &IndexedRow, mode: ViewMode) -> Option<f64> {
    match mode {
        ViewMode::Levels => Some(r.row.record.value),
        ViewMode::Yoy => r.row.yoy_pct,
        ViewMode::Indexed => r.indexed_100,
    }
}

/// Two decimals with `,` every three integer digits; the sign is kept outside the grouping.
fn fmt_thousands(v: f64) -> String {
    let s = format!("{:.2}", v.abs());
    let (int_part, frac) = s.split_once('.').unwrap_or((s.as_str(), "00"));
    let mut grouped = String::new();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if v < 0.0 { "-" } else { "" };
    format!("{sign}{grouped}.{frac}")
}
