//! Evaluation metrics: Recall@K, Precision@K and binary accuracy.

use std::collections::HashSet;
use std::hash::Hash;

/// Number of distinct items in `retrieved[..k]` that also appear in `relevant`.
fn hits_in_top_k<T: Eq + Hash>(retrieved: &[T], relevant: &HashSet<&T>, k: usize) -> usize {
    retrieved
        .iter()
        .take(k)
        .collect::<HashSet<&T>>()
        .intersection(relevant)
        .count()
}

/// Recall at K: proportion of distinct relevant items that appear in the top-K.
///
/// `k = None` considers the whole retrieved list, and a `k` past the end is clamped.
/// Returns 0.0 when there are no relevant items.
pub fn recall_at_k<T: Eq + Hash>(retrieved: &[T], relevant: &[T], k: Option<usize>) -> f32 {
    let relevant: HashSet<&T> = relevant.iter().collect();
    if relevant.is_empty() {
        return 0.0;
    }
    let k = k.unwrap_or(retrieved.len());
    hits_in_top_k(retrieved, &relevant, k) as f32 / relevant.len() as f32
}

/// Precision at K: relevant items in the top-K over the number of distinct retrieved
/// items (the full list, not K). Returns 0.0 when nothing was retrieved.
pub fn precision_at_k<T: Eq + Hash>(retrieved: &[T], relevant: &[T], k: Option<usize>) -> f32 {
    let distinct_retrieved = retrieved.iter().collect::<HashSet<&T>>().len();
    if distinct_retrieved == 0 {
        return 0.0;
    }
    let relevant: HashSet<&T> = relevant.iter().collect();
    let k = k.unwrap_or(retrieved.len());
    hits_in_top_k(retrieved, &relevant, k) as f32 / distinct_retrieved as f32
}

/// Fraction of positions where prediction equals truth. Returns 0.0 for empty input.
///
/// Slices are compared pairwise up to the shorter length.
pub fn binary_accuracy(truth: &[u8], pred: &[u8]) -> f32 {
    let n = truth.len().min(pred.len());
    if n == 0 {
        return 0.0;
    }
    let matches = truth.iter().zip(pred).filter(|(t, p)| t == p).count();
    matches as f32 / n as f32
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f32]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f32>() / values.len() as f32)
}
