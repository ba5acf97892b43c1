use crate::measure::outcome::{FittingSummary, TrayRun};
use std::collections::BTreeMap;

/// Label a tray size the way summaries key it, e.g. `100mm`.
pub fn size_label(size_mm: u32) -> String {
    format!("{}mm", size_mm)
}

/// Fold tray runs into per-size fitting totals.
///
/// Couplers are inferred: one fewer than the stock lengths of that size.
pub fn summarize_fittings(runs: &[TrayRun]) -> BTreeMap<String, FittingSummary> {
    let mut by_size: BTreeMap<u32, FittingSummary> = BTreeMap::new();

    for run in runs {
        let entry = by_size.entry(run.size_mm).or_default();
        entry.length_metres += run.length_metres;
        entry.wholesaler_lengths += run.wholesaler_lengths;
        entry.t_pieces += run.t_pieces;
        entry.cross_pieces += run.cross_pieces;
        entry.bends_90 += run.bends_90;
        entry.drops += run.drops;
    }

    by_size
        .into_iter()
        .map(|(size_mm, mut summary)| {
            summary.length_metres = (summary.length_metres * 10.0).round() / 10.0;
            summary.couplers = summary.wholesaler_lengths.saturating_sub(1);
            (size_label(size_mm), summary)
        })
        .collect()
}
