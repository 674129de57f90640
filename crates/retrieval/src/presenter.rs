//! Single display list built from both spaces.
//!
//! Base and custom scores come from different models and are not calibrated
//! against each other, so the merged order is a presentation aid only. The
//! per-space lists in [`QueryResult`] stay the authoritative rankings.

use semantic::ModelRole;

use crate::types::{HitView, QueryResult, RankedHit};

/// Shipped alongside every merged list.
pub const MERGE_CAVEAT: &str = "Scores from the base and custom models are not calibrated \
against each other; this combined ordering is for display only.";

/// Concatenates base then custom hits, drops error entries and sorts by
/// descending score. The sort is stable, so ties keep base ahead of custom
/// and otherwise preserve list order.
pub fn merge_for_display(result: &QueryResult) -> Vec<RankedHit> {
    let mut merged: Vec<RankedHit> = ModelRole::ALL
        .iter()
        .flat_map(|&origin| {
            result
                .space(origin)
                .iter()
                .filter_map(HitView::as_hit)
                .map(move |hit| RankedHit {
                    origin,
                    hit: hit.clone(),
                })
        })
        .collect();
    merged.sort_by(|a, b| b.hit.score.total_cmp(&a.hit.score));
    merged
}
