//! Review Pulse - resilient client for sentiment analysis services.
//!
//! Fetches sentiment-scored reviews from a remote scoring service with
//! bounded retries, validates and ranks them, and summarizes them by
//! sentiment category.
//!
//! ```no_run
//! use review_pulse::client::{HttpTransport, Orchestrator};
//! use review_pulse::pipeline::Pipeline;
//! use review_pulse::retry::RetryPolicy;
//! use std::time::Duration;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let transport = HttpTransport::new(Duration::from_secs(30))?;
//! let pipeline = Pipeline::new(Orchestrator::new(
//!     transport,
//!     "http://localhost:5000",
//!     RetryPolicy::default(),
//! ));
//!
//! let snapshot = pipeline.submit_reviews("Great product!\nTerrible quality").await?;
//! println!("{} reviews", snapshot.summary.total);
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod retry;

pub use error::{FetchError, PipelineError, ValidationError};
pub use models::{FetchSource, ResultCollection, ReviewResult, Sentiment, SentimentSummary};
pub use pipeline::{Pipeline, PipelineSnapshot};
