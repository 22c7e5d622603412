//! Batch-level review flags: a business whose stores resolved to more than
//! one distinct handle needs a human to look at it.

use std::collections::{BTreeMap, BTreeSet};

use igfind_core::DiscoveryResult;

pub const REVIEW_FLAG: &str = "FLAG";

/// Business IDs with more than one distinct non-empty handle
/// (case-insensitive). Rows without a business ID are never grouped.
#[must_use]
pub fn flagged_businesses(results: &[DiscoveryResult]) -> BTreeSet<String> {
    let mut handles: BTreeMap<&str, BTreeSet<String>> = BTreeMap::new();
    for result in results {
        let business = result.business_id.trim();
        let handle = result.instagram_handle.trim();
        if business.is_empty() || handle.is_empty() {
            continue;
        }
        handles
            .entry(business)
            .or_default()
            .insert(handle.to_lowercase());
    }
    handles
        .into_iter()
        .filter(|(_, set)| set.len() > 1)
        .map(|(business, _)| business.to_string())
        .collect()
}

/// Set `review` on every row: [`REVIEW_FLAG`] for flagged businesses,
/// empty otherwise. Returns the flagged business IDs.
pub fn apply_review_flags(results: &mut [DiscoveryResult]) -> BTreeSet<String> {
    let flagged = flagged_businesses(results);
    for result in results.iter_mut() {
        result.review = if flagged.contains(result.business_id.trim()) {
            REVIEW_FLAG.to_string()
        } else {
            String::new()
        };
    }
    if !flagged.is_empty() {
        tracing::info!(businesses = flagged.len(), "businesses flagged for review");
    }
    flagged
}
