//! Tie-aware top-N ranking
//!
//! Generic over any item type given a value extractor. Shared by the
//! correlation top-factor selection and the intervention top/bottom
//! selection.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// One ranked item; recomputed per ranking request, no persistent identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry<T> {
    pub item: T,
    pub value: f64,
}

/// Select the items "tied for top" under a closeness rule.
///
/// Sort descending by value; let `vN` be the `n`-th ranked value (or the top
/// value when fewer than `n` items exist). An item's rank is the index of the
/// first item sharing its value, so equal values share a rank. Every item
/// with rank below `n` is included unconditionally; an item at rank `r >= n`
/// is included iff `|value / vN| >= threshold * r / n`, so the admission bar
/// relaxes linearly with rank. A zero `vN` admits nothing past the
/// unconditional set.
pub fn top_n_with_ties<T, F>(items: &[T], n: usize, threshold: f64, value: F) -> Vec<RankedEntry<T>>
where
    T: Clone,
    F: Fn(&T) -> f64,
{
    if items.is_empty() || n == 0 {
        return Vec::new();
    }

    let mut sorted: Vec<RankedEntry<T>> = items
        .iter()
        .map(|item| RankedEntry {
            item: item.clone(),
            value: value(item),
        })
        .collect();
    sorted.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(Ordering::Equal));

    let pivot = sorted
        .get(n - 1)
        .or_else(|| sorted.first())
        .map(|entry| entry.value)
        .unwrap_or(0.0);

    let values: Vec<f64> = sorted.iter().map(|entry| entry.value).collect();
    sorted
        .into_iter()
        .enumerate()
        .filter(|(index, entry)| {
            // competition ranking: equal values share the earliest index
            let rank = values
                .iter()
                .position(|v| *v == entry.value)
                .unwrap_or(*index);
            if rank < n {
                return true;
            }
            if pivot == 0.0 {
                return false;
            }
            (entry.value / pivot).abs() >= threshold * rank as f64 / n as f64
        })
        .map(|(_, entry)| entry)
        .collect()
}
