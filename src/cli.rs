//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::report::ReportFormat;
use clap::Parser;
use std::path::PathBuf;

/// Review Pulse - sentiment summaries from a review analysis service
///
/// Submit reviews (or load the service's stored dataset), then print the
/// ranked results and a per-sentiment summary.
///
/// Examples:
///   review-pulse --text "Great product!" --text "Terrible quality"
///   review-pulse --file reviews.txt --format markdown --output report.md
///   review-pulse --load-data --top 10
///   review-pulse --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Review text to analyze (repeatable)
    #[arg(short, long, value_name = "TEXT")]
    pub text: Vec<String>,

    /// File with one review per line
    #[arg(short, long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Analyze the service's stored dataset instead of free text
    #[arg(long, conflicts_with_all = ["text", "file"])]
    pub load_data: bool,

    /// Analysis service base URL
    ///
    /// Overrides the config file. Default: http://localhost:5000.
    #[arg(long, value_name = "URL", env = "REVIEW_PULSE_URL")]
    pub base_url: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .reviewpulse.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format (table, markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<ReportFormat>,

    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Only list the first N ranked results
    #[arg(long, value_name = "COUNT")]
    pub top: Option<usize>,

    /// Per-attempt request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Total attempts per fetch, including the first
    #[arg(long, value_name = "NUM")]
    pub max_attempts: Option<u32>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .reviewpulse.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Whether any free-text input was given.
    pub fn has_text_input(&self) -> bool {
        !self.text.is_empty() || self.file.is_some()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if !self.load_data && !self.has_text_input() {
            return Err("Provide reviews with --text/--file, or use --load-data".to_string());
        }

        if let Some(ref url) = self.base_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Base URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        if self.max_attempts == Some(0) {
            return Err("Max attempts must be at least 1".to_string());
        }

        if self.top == Some(0) {
            return Err("Top must be at least 1".to_string());
        }

        if let Some(ref file) = self.file {
            if !file.is_file() {
                return Err(format!("Review file does not exist: {}", file.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Collect free-text input as newline-separated reviews.
    pub fn review_input(&self) -> std::io::Result<String> {
        let mut lines = self.text.clone();

        if let Some(ref file) = self.file {
            lines.push(std::fs::read_to_string(file)?);
        }

        Ok(lines.join("\n"))
    }
}
