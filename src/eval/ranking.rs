use crate::error::{EvalError, Result};
use std::cmp::Ordering;

/// Descending by score, NaN after every other value.
fn descending(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

/// Indices of `scores` ordered by descending score. Ties keep their original order.
pub fn sorted_indices(scores: &[f32]) -> Vec<usize> {
    let mut idxs: Vec<usize> = (0..scores.len()).collect();
    // sort_by is stable
    idxs.sort_by(|&i, &j| descending(scores[i], scores[j]));
    idxs
}

/// Reorder `ids` by the parallel `scores`, highest first.
pub fn rank_by_score<T: Clone>(scores: &[f32], ids: &[T]) -> Result<Vec<T>> {
    if scores.len() != ids.len() {
        return Err(EvalError::InvalidInput(format!(
            "{} scores for {} candidates",
            scores.len(),
            ids.len()
        )));
    }
    Ok(sorted_indices(scores)
        .into_iter()
        .map(|i| ids[i].clone())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_descending() {
        let ranked = rank_by_score(&[0.1, 0.9, 0.5], &["a", "b", "c"]).unwrap();
        assert_eq!(ranked, vec!["b", "c", "a"]);
    }

    #[test]
    fn ties_keep_input_order() {
        let ranked = rank_by_score(&[0.5, 0.7, 0.5, 0.7, 0.5], &[0, 1, 2, 3, 4]).unwrap();
        assert_eq!(ranked, vec![1, 3, 0, 2, 4]);
    }

    #[test]
    fn result_is_permutation() {
        let scores = [0.3, 0.3, 0.1, 0.8, f32::NAN, 0.0];
        let ids: Vec<usize> = (0..scores.len()).collect();
        let mut ranked = rank_by_score(&scores, &ids).unwrap();
        assert_eq!(ranked[0], 3);
        assert_eq!(*ranked.last().unwrap(), 4);
        ranked.sort_unstable();
        assert_eq!(ranked, ids);
    }

    #[test]
    fn length_mismatch_is_error() {
        assert!(matches!(
            rank_by_score(&[0.1], &["a", "b"]),
            Err(EvalError::InvalidInput(_))
        ));
    }

    #[test]
    fn empty_input() {
        let ranked: Vec<&str> = rank_by_score(&[], &[]).unwrap();
        assert!(ranked.is_empty());
    }
}
