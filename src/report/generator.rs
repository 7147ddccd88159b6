//! Report generation.
//!
//! This module renders ranked results and their summary as a plain text
//! table, a Markdown document, or JSON.

use crate::analysis::{generate_summary_text, rating_distribution, score_statistics, top_results};
use crate::models::{
    FetchSource, ResultCollection, ReviewResult, ScoreStatistics, Sentiment, SentimentSummary,
};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maximum characters of review text shown in tables.
const REVIEW_WIDTH: usize = 60;

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Plain text table (default)
    #[default]
    Table,
    /// Markdown document
    Markdown,
    /// JSON document
    Json,
}

/// Metadata about the fetch behind a report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Base URL of the analysis service.
    pub service_url: String,
    /// Where the results came from.
    pub source: FetchSource,
    /// When the results were received.
    pub fetched_at: DateTime<Utc>,
    /// Attempts the fetch needed.
    pub attempts: u32,
}

/// Everything a report shows.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub summary: SentimentSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<ScoreStatistics>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub rating_distribution: BTreeMap<i64, usize>,
    /// Ranked results, possibly cut to the configured top N.
    pub results: Vec<ReviewResult>,
    /// Include the polarity breakdown in tables.
    #[serde(skip)]
    pub show_scores: bool,
}

impl Report {
    /// Build a report from a ranked collection.
    pub fn new(
        metadata: ReportMetadata,
        results: &ResultCollection,
        summary: SentimentSummary,
        top: Option<usize>,
    ) -> Self {
        let shown = match top {
            Some(n) => top_results(results, n).to_vec(),
            None => results.as_slice().to_vec(),
        };

        Self {
            metadata,
            summary,
            statistics: score_statistics(results),
            rating_distribution: rating_distribution(results),
            results: shown,
            show_scores: true,
        }
    }

    /// Ratings are only meaningful for stored dataset results.
    fn show_ratings(&self) -> bool {
        self.metadata.source == FetchSource::Dataset
    }
}

/// Render the report in the given format.
pub fn render(report: &Report, format: ReportFormat) -> Result<String> {
    Ok(match format {
        ReportFormat::Table => generate_text_report(report),
        ReportFormat::Markdown => generate_markdown_report(report),
        ReportFormat::Json => generate_json_report(report)?,
    })
}

/// Generate a plain text report.
pub fn generate_text_report(report: &Report) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "Results from {} ({}), fetched {}\n\n",
        report.metadata.service_url,
        report.metadata.source,
        report.metadata.fetched_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    output.push_str(&generate_summary_text(&report.summary));
    output.push_str("\n\n");

    if let Some(stats) = report.statistics {
        output.push_str(&format!(
            "Compound score: mean {:+.3}, min {:+.3}, max {:+.3}\n",
            stats.mean, stats.min, stats.max
        ));
        match stats.mean_rating {
            Some(mean_rating) if report.show_ratings() => {
                output.push_str(&format!("Mean rating: {:.2}\n", mean_rating));
            }
            _ => {}
        }
        output.push('\n');
    }

    if report.results.is_empty() {
        output.push_str("No results.\n");
        return output;
    }

    let mut header = format!("{:>4}  {:<8}  {:>7}", "#", "Label", "Score");
    if report.show_ratings() {
        header.push_str(&format!("  {:>6}", "Rating"));
    }
    if report.show_scores {
        header.push_str(&format!("  {:<17}", "Pos/Neu/Neg"));
    }
    header.push_str("  Review\n");
    output.push_str(&header);

    for (i, result) in report.results.iter().enumerate() {
        let mut row = format!(
            "{:>4}  {:<8}  {:>+7.4}",
            i + 1,
            result.sentiment.to_string(),
            result.compound_score
        );
        if report.show_ratings() {
            let rating = result
                .rating
                .map(|r| r.to_string())
                .unwrap_or_else(|| "-".to_string());
            row.push_str(&format!("  {:>6}", rating));
        }
        if report.show_scores {
            row.push_str(&format!("  {:<17}", polarity_cell(result)));
        }
        row.push_str(&format!("  {}\n", truncate(&result.review_text, REVIEW_WIDTH)));
        output.push_str(&row);
    }

    output
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    output.push_str("# Review Pulse Report\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_summary_section(report));
    output.push_str(&generate_results_section(report));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Service:** {}\n", metadata.service_url));
    section.push_str(&format!("- **Source:** {}\n", metadata.source));
    section.push_str(&format!(
        "- **Fetched:** {}\n",
        metadata.fetched_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    if metadata.attempts > 1 {
        section.push_str(&format!("- **Attempts:** {}\n", metadata.attempts));
    }
    section.push('\n');

    section
}

/// Generate the summary section.
fn generate_summary_section(report: &Report) -> String {
    let summary = &report.summary;
    let mut section = String::new();

    section.push_str("## Summary\n\n");

    if summary.total == 0 {
        section.push_str("No results.\n\n");
        return section;
    }

    section.push_str("| Sentiment | Count | Share |\n");
    section.push_str("|:---|:---:|:---:|\n");
    for sentiment in Sentiment::ALL {
        if let Some(stat) = summary.category(sentiment) {
            section.push_str(&format!(
                "| {} {} | {} | {:.1}% |\n",
                sentiment.emoji(),
                sentiment,
                stat.count,
                stat.percent
            ));
        }
    }
    section.push_str(&format!("| **Total** | **{}** | |\n\n", summary.total));

    if let Some(dominant) = summary.dominant() {
        section.push_str(&format!("Overall tone: **{}**\n\n", dominant));
    }

    if let Some(stats) = report.statistics {
        section.push_str("### Compound Score\n\n");
        section.push_str("| Mean | Min | Max |\n");
        section.push_str("|:---:|:---:|:---:|\n");
        section.push_str(&format!(
            "| {:+.3} | {:+.3} | {:+.3} |\n\n",
            stats.mean, stats.min, stats.max
        ));
    }

    if report.show_ratings() && !report.rating_distribution.is_empty() {
        section.push_str("### Ratings\n\n");
        section.push_str("| Rating | Reviews |\n");
        section.push_str("|:---:|:---:|\n");
        for (rating, count) in &report.rating_distribution {
            section.push_str(&format!("| {} | {} |\n", rating, count));
        }
        section.push('\n');
    }

    section
}

/// Generate the ranked results table.
fn generate_results_section(report: &Report) -> String {
    let mut section = String::new();

    section.push_str("## Results\n\n");

    if report.results.is_empty() {
        section.push_str("No results.\n\n");
        return section;
    }

    let mut header = String::from("| # | Sentiment | Score |");
    let mut align = String::from("|:---:|:---|:---:|");
    if report.show_ratings() {
        header.push_str(" Rating |");
        align.push_str(":---:|");
    }
    if report.show_scores {
        header.push_str(" Pos/Neu/Neg |");
        align.push_str(":---:|");
    }
    header.push_str(" Review |\n");
    align.push_str(":---|\n");
    section.push_str(&header);
    section.push_str(&align);

    for (i, result) in report.results.iter().enumerate() {
        let mut row = format!(
            "| {} | {} {} | {:+.4} |",
            i + 1,
            result.sentiment.emoji(),
            result.sentiment,
            result.compound_score
        );
        if report.show_ratings() {
            let rating = result
                .rating
                .map(|r| r.to_string())
                .unwrap_or_else(|| "-".to_string());
            row.push_str(&format!(" {} |", rating));
        }
        if report.show_scores {
            row.push_str(&format!(" {} |", polarity_cell(result)));
        }
        row.push_str(&format!(" {} |\n", escape_cell(&result.review_text)));
        section.push_str(&row);
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    "---\n\n*Report generated by Review Pulse*\n".to_string()
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

fn polarity_cell(result: &ReviewResult) -> String {
    match result.scores {
        Some(s) => format!("{:.2}/{:.2}/{:.2}", s.positive, s.neutral, s.negative),
        None => "-".to_string(),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    let flat = text.replace(['\n', '\r'], " ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let cut: String = flat.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", cut)
}

fn escape_cell(text: &str) -> String {
    text.replace(['\n', '\r'], " ").replace('|', "\\|")
}
