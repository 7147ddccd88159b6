//! Result aggregation and statistics.
//!
//! This module computes per-category counts and percentages over a result
//! collection, plus a few supporting statistics for reports. Everything
//! here is a pure function of its input.

use crate::models::{
    CategoryStat, ResultCollection, ReviewResult, ScoreStatistics, Sentiment, SentimentSummary,
};
use std::collections::BTreeMap;

/// Summarize a collection by sentiment category.
///
/// Percentages are `100 * count / total` and are not re-normalized, so
/// their sum can drift from 100 by floating-point rounding. An empty
/// collection yields a summary with no category entries.
pub fn summarize(collection: &ResultCollection) -> SentimentSummary {
    let total = collection.len();
    if total == 0 {
        return SentimentSummary::default();
    }

    let mut positive = 0;
    let mut neutral = 0;
    let mut negative = 0;

    for result in collection {
        match result.sentiment {
            Sentiment::Positive => positive += 1,
            Sentiment::Neutral => neutral += 1,
            Sentiment::Negative => negative += 1,
        }
    }

    let stat = |count: usize| CategoryStat {
        count,
        percent: 100.0 * count as f64 / total as f64,
    };

    SentimentSummary {
        total,
        positive: Some(stat(positive)),
        neutral: Some(stat(neutral)),
        negative: Some(stat(negative)),
    }
}

/// Mean, min and max compound score, and mean rating over rated results.
pub fn score_statistics(collection: &ResultCollection) -> Option<ScoreStatistics> {
    if collection.is_empty() {
        return None;
    }

    let mut sum = 0.0;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;

    for result in collection {
        sum += result.compound_score;
        min = min.min(result.compound_score);
        max = max.max(result.compound_score);
    }

    let ratings: Vec<i64> = collection.iter().filter_map(|r| r.rating).collect();
    let mean_rating = if ratings.is_empty() {
        None
    } else {
        Some(ratings.iter().sum::<i64>() as f64 / ratings.len() as f64)
    };

    Some(ScoreStatistics {
        mean: sum / collection.len() as f64,
        min,
        max,
        mean_rating,
    })
}

/// Get the first `n` results of a ranked collection.
pub fn top_results(collection: &ResultCollection, n: usize) -> &[ReviewResult] {
    let slice = collection.as_slice();
    &slice[..n.min(slice.len())]
}

/// Count results per rating value, ascending by rating.
pub fn rating_distribution(collection: &ResultCollection) -> BTreeMap<i64, usize> {
    let mut dist = BTreeMap::new();

    for rating in collection.iter().filter_map(|r| r.rating) {
        *dist.entry(rating).or_default() += 1;
    }

    dist
}

/// Generate a text summary of sentiment statistics.
pub fn generate_summary_text(summary: &SentimentSummary) -> String {
    let mut lines = Vec::new();

    lines.push(format!("Total Reviews: {}", summary.total));

    for sentiment in Sentiment::ALL {
        let line = match summary.category(sentiment) {
            Some(stat) => format!(
                "- {} {}: {} ({:.1}%)",
                sentiment.emoji(),
                sentiment,
                stat.count,
                stat.percent
            ),
            None => format!("- {} {}: n/a", sentiment.emoji(), sentiment),
        };
        lines.push(line);
    }

    lines.join("\n")
}
