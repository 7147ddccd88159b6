//! Deterministic ordering of results for presentation.

use crate::models::{ResultCollection, ReviewResult};
use std::cmp::Ordering;

/// Order results by compound score, highest first.
///
/// The sort is stable: results with equal scores keep their input order,
/// so ranking an already ranked collection is a no-op.
pub fn rank(collection: ResultCollection) -> ResultCollection {
    let mut results = collection.into_vec();
    sort_by_score(&mut results);
    ResultCollection::new(results)
}

/// Sort results in place by compound score (highest first).
pub fn sort_by_score(results: &mut [ReviewResult]) {
    // Scores are validated finite, so `Equal` only covers true ties.
    results.sort_by(|a, b| {
        b.compound_score
            .partial_cmp(&a.compound_score)
            .unwrap_or(Ordering::Equal)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sentiment;

    fn result(id: u64, score: f64) -> ReviewResult {
        ReviewResult {
            id,
            review_text: format!("review {}", id),
            sentiment: if score > 0.05 {
                Sentiment::Positive
            } else if score < -0.05 {
                Sentiment::Negative
            } else {
                Sentiment::Neutral
            },
            compound_score: score,
            rating: None,
            scores: None,
        }
    }

    fn ids(collection: &ResultCollection) -> Vec<u64> {
        collection.iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_descending_order() {
        let collection = ResultCollection::new(vec![
            result(1, -0.6),
            result(2, 0.8),
            result(3, 0.0),
            result(4, 0.3),
        ]);

        let ranked = rank(collection);

        assert_eq!(ids(&ranked), vec![2, 4, 3, 1]);
        for pair in ranked.as_slice().windows(2) {
            assert!(pair[0].compound_score >= pair[1].compound_score);
        }
    }

    #[test]
    fn test_ties_keep_input_order() {
        let collection = ResultCollection::new(vec![
            result(1, 0.5),
            result(2, 0.9),
            result(3, 0.5),
            result(4, 0.5),
            result(5, -0.0),
            result(6, 0.0),
        ]);

        let ranked = rank(collection);

        assert_eq!(ids(&ranked), vec![2, 1, 3, 4, 5, 6]);
    }

    #[test]
    fn test_ranking_is_idempotent() {
        let collection = ResultCollection::new(vec![
            result(1, 0.1),
            result(2, 0.1),
            result(3, -0.4),
            result(4, 0.7),
        ]);

        let once = rank(collection);
        let twice = rank(once.clone());

        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_collection() {
        assert!(rank(ResultCollection::default()).is_empty());
    }
}
