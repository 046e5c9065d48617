use std::collections::HashSet;

use crate::domain::ContentItem;
use crate::utils::is_within_window;

/// Knobs controlling how many items survive selection.
#[derive(Debug, Clone)]
pub struct SelectionParams {
    pub window_hours: i64,
    pub max_per_source: usize,
    pub max_total: usize,
}

impl Default for SelectionParams {
    fn default() -> Self {
        Self {
            window_hours: 24,
            max_per_source: 6,
            max_total: 24,
        }
    }
}

/// Per-source filtering: drop already-sent items and items outside the
/// recency window. Only the first `max_per_source` items are considered,
/// and dropped items still count against the cap, so a backlog of
/// already-sent stories never pulls deeper entries into the digest.
/// Items without a timestamp pass the window check on benefit of the
/// doubt.
pub fn filter_source(
    items: Vec<ContentItem>,
    sent_urls: &HashSet<String>,
    params: &SelectionParams,
) -> Vec<ContentItem> {
    let mut kept = Vec::new();
    for item in items.into_iter().take(params.max_per_source) {
        if sent_urls.contains(&item.canonical_url) {
            continue;
        }
        if item.published_at.is_some() && !is_within_window(item.published_at, params.window_hours) {
            continue;
        }
        kept.push(item);
    }
    kept
}

/// Cross-source merge: dedup by canonical URL (first occurrence wins, so
/// source registration order breaks ties), drop anything already sent,
/// order newest first with undated items last, and cap the total.
pub fn rank(
    items: Vec<ContentItem>,
    sent_urls: &HashSet<String>,
    max_total: usize,
) -> Vec<ContentItem> {
    let mut seen = HashSet::new();
    let mut unique: Vec<ContentItem> = items
        .into_iter()
        .filter(|item| !sent_urls.contains(&item.canonical_url))
        .filter(|item| seen.insert(item.canonical_url.clone()))
        .collect();

    // Stable sort keeps arrival order among equal timestamps; None orders
    // below every Some, so undated items land at the end.
    unique.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    unique.truncate(max_total);
    unique
}
