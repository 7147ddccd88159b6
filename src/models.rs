//! Data models for analyzed reviews.
//!
//! This module contains the core data structures shared by the fetch
//! pipeline, the aggregation engine and the report generator.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Sentiment category assigned by the scoring service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sentiment {
    /// Compound score above the positive threshold.
    Positive,
    /// Compound score between the two thresholds.
    Neutral,
    /// Compound score below the negative threshold.
    Negative,
}

impl Sentiment {
    /// All categories in display order.
    pub const ALL: [Sentiment; 3] = [Sentiment::Positive, Sentiment::Neutral, Sentiment::Negative];

    /// Returns an emoji representation of the sentiment.
    pub fn emoji(&self) -> &'static str {
        match self {
            Sentiment::Positive => "🟢",
            Sentiment::Neutral => "🟡",
            Sentiment::Negative => "🔴",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sentiment::Positive => write!(f, "Positive"),
            Sentiment::Neutral => write!(f, "Neutral"),
            Sentiment::Negative => write!(f, "Negative"),
        }
    }
}

/// Where the active result collection came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchSource {
    /// Reviews typed or piped in by the user.
    FreeText,
    /// The service's stored dataset.
    Dataset,
}

impl fmt::Display for FetchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchSource::FreeText => write!(f, "free text"),
            FetchSource::Dataset => write!(f, "stored dataset"),
        }
    }
}

/// Per-polarity proportions reported alongside the compound score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolarityScores {
    pub positive: f64,
    pub neutral: f64,
    pub negative: f64,
}

/// One analyzed review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireReview")]
pub struct ReviewResult {
    /// Identifier, unique within a single collection.
    pub id: u64,
    /// The review text as scored by the service.
    #[serde(rename = "review")]
    pub review_text: String,
    /// Category assigned upstream.
    pub sentiment: Sentiment,
    /// Signed sentiment magnitude in [-1.0, 1.0].
    pub compound_score: f64,
    /// Star rating, only present for stored dataset records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<i64>,
    /// Polarity breakdown, when the service sent one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scores: Option<PolarityScores>,
}

/// Record shape as it appears on the wire.
#[derive(Debug, Deserialize)]
struct WireReview {
    id: u64,
    review: String,
    sentiment: Sentiment,
    compound_score: f64,
    #[serde(default, deserialize_with = "deserialize_rating")]
    rating: Option<i64>,
    #[serde(default)]
    pos: Option<f64>,
    #[serde(default)]
    neu: Option<f64>,
    #[serde(default)]
    neg: Option<f64>,
}

impl TryFrom<WireReview> for ReviewResult {
    type Error = String;

    fn try_from(wire: WireReview) -> Result<Self, Self::Error> {
        if !wire.compound_score.is_finite() || !(-1.0..=1.0).contains(&wire.compound_score) {
            return Err(format!(
                "compound_score {} is outside [-1.0, 1.0]",
                wire.compound_score
            ));
        }

        let scores = match (wire.pos, wire.neu, wire.neg) {
            (Some(positive), Some(neutral), Some(negative)) => Some(PolarityScores {
                positive,
                neutral,
                negative,
            }),
            _ => None,
        };

        Ok(Self {
            id: wire.id,
            review_text: wire.review,
            sentiment: wire.sentiment,
            compound_score: wire.compound_score,
            rating: wire.rating,
            scores,
        })
    }
}

/// Accepts integers, integral floats (`4.0`) and `null` for a rating.
fn deserialize_rating<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                return Ok(Some(i));
            }
            match n.as_f64() {
                Some(f) if f.is_finite() && f.fract() == 0.0 => Ok(Some(f as i64)),
                _ => Err(D::Error::custom(format!("rating {} is not an integer", n))),
            }
        }
        Some(other) => Err(D::Error::custom(format!(
            "rating must be a number, got {}",
            other
        ))),
    }
}

/// An ordered sequence of results produced by a single fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultCollection {
    results: Vec<ReviewResult>,
}

impl ResultCollection {
    pub fn new(results: Vec<ReviewResult>) -> Self {
        Self { results }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ReviewResult> {
        self.results.iter()
    }

    pub fn as_slice(&self) -> &[ReviewResult] {
        &self.results
    }

    pub fn into_vec(self) -> Vec<ReviewResult> {
        self.results
    }

    /// Whether any record carries a rating.
    pub fn has_ratings(&self) -> bool {
        self.results.iter().any(|r| r.rating.is_some())
    }
}

impl From<Vec<ReviewResult>> for ResultCollection {
    fn from(results: Vec<ReviewResult>) -> Self {
        Self::new(results)
    }
}

impl<'a> IntoIterator for &'a ResultCollection {
    type Item = &'a ReviewResult;
    type IntoIter = std::slice::Iter<'a, ReviewResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

/// Count and share of one sentiment category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryStat {
    pub count: usize,
    pub percent: f64,
}

/// Summary statistics over a result collection.
///
/// Category entries are `None` when the collection is empty, since a
/// percentage of nothing is undefined.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentSummary {
    /// Number of results.
    pub total: usize,
    pub positive: Option<CategoryStat>,
    pub neutral: Option<CategoryStat>,
    pub negative: Option<CategoryStat>,
}

impl SentimentSummary {
    /// Returns the stat for one category.
    pub fn category(&self, sentiment: Sentiment) -> Option<CategoryStat> {
        match sentiment {
            Sentiment::Positive => self.positive,
            Sentiment::Neutral => self.neutral,
            Sentiment::Negative => self.negative,
        }
    }

    /// Count for a category, zero when undefined.
    pub fn count(&self, sentiment: Sentiment) -> usize {
        self.category(sentiment).map(|c| c.count).unwrap_or(0)
    }

    /// Category with the most results.
    ///
    /// Ties go to the earlier category in [`Sentiment::ALL`].
    pub fn dominant(&self) -> Option<Sentiment> {
        if self.total == 0 {
            return None;
        }

        let mut best = Sentiment::Positive;
        for sentiment in Sentiment::ALL {
            if self.count(sentiment) > self.count(best) {
                best = sentiment;
            }
        }
        Some(best)
    }
}

/// Compound score and rating statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreStatistics {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_rating: Option<f64>,
}
