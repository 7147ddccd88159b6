//! Pipeline controller.
//!
//! Owns the session state (current results, last error, busy flag) and
//! drives it through `Idle -> Fetching -> {Success, Failed} -> Idle`.
//! Consumers only ever see cloned snapshots.

use crate::analysis::summarize;
use crate::client::{FetchRequest, HttpTransport, Orchestrator, Transport};
use crate::error::{FetchError, PipelineError};
use crate::models::{FetchSource, ResultCollection, SentimentSummary};
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{info, warn};

/// Whether a fetch is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Idle,
    Fetching,
}

/// How the most recent fetch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failed,
}

/// Read-only view of the pipeline state.
#[derive(Debug, Clone, Default)]
pub struct PipelineSnapshot {
    pub status: Status,
    /// Ranked results of the last successful fetch; empty after a failure.
    pub results: ResultCollection,
    pub summary: SentimentSummary,
    pub source: Option<FetchSource>,
    pub last_error: Option<FetchError>,
    pub last_outcome: Option<Outcome>,
    /// Attempts made by the last fetch.
    pub attempts: u32,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl PipelineSnapshot {
    pub fn is_busy(&self) -> bool {
        self.status == Status::Fetching
    }
}

/// Drives fetches and holds their results for the session.
pub struct Pipeline<T: Transport = HttpTransport> {
    orchestrator: Orchestrator<T>,
    state: watch::Sender<PipelineSnapshot>,
}

impl<T: Transport> Pipeline<T> {
    pub fn new(orchestrator: Orchestrator<T>) -> Self {
        let (state, _) = watch::channel(PipelineSnapshot::default());
        Self {
            orchestrator,
            state,
        }
    }

    pub fn orchestrator(&self) -> &Orchestrator<T> {
        &self.orchestrator
    }

    /// Current state.
    pub fn snapshot(&self) -> PipelineSnapshot {
        self.state.borrow().clone()
    }

    /// Receive every state transition.
    pub fn subscribe(&self) -> watch::Receiver<PipelineSnapshot> {
        self.state.subscribe()
    }

    /// Analyze newline-separated reviews.
    ///
    /// Lines are trimmed and blank lines dropped. If nothing is left the
    /// call fails without touching the state or the network.
    pub async fn submit_reviews(&self, raw: &str) -> Result<PipelineSnapshot, PipelineError> {
        let reviews = prepare_reviews(raw);
        if reviews.is_empty() {
            return Err(PipelineError::NoReviews);
        }

        self.run(FetchRequest::Analyze { reviews }).await
    }

    /// Load and analyze the service's stored dataset.
    pub async fn load_dataset(&self) -> Result<PipelineSnapshot, PipelineError> {
        self.run(FetchRequest::LoadData).await
    }

    /// Run one fetch through the state machine.
    ///
    /// Fails with [`PipelineError::Busy`] if a fetch is already running;
    /// the running fetch is unaffected.
    pub async fn run(&self, request: FetchRequest) -> Result<PipelineSnapshot, PipelineError> {
        let started = self.state.send_if_modified(|s| {
            if s.status == Status::Fetching {
                false
            } else {
                s.status = Status::Fetching;
                true
            }
        });
        if !started {
            warn!("Ignoring {} request: a fetch is already in progress", request.path());
            return Err(PipelineError::Busy);
        }
        let _guard = FetchGuard { state: &self.state };

        let retried = self.orchestrator.fetch(&request).await;
        let attempts = retried.attempts;

        match retried.result {
            Ok(outcome) => {
                let summary = summarize(&outcome.results);
                info!(
                    "Loaded {} results from {} ({} attempt(s))",
                    summary.total, outcome.source, attempts
                );
                self.state.send_modify(|s| {
                    s.results = outcome.results;
                    s.summary = summary;
                    s.source = Some(outcome.source);
                    s.last_error = None;
                    s.last_outcome = Some(Outcome::Success);
                    s.attempts = attempts;
                    s.fetched_at = Some(Utc::now());
                    s.status = Status::Idle;
                });
                Ok(self.snapshot())
            }
            Err(e) => {
                self.state.send_modify(|s| {
                    s.results = ResultCollection::default();
                    s.summary = SentimentSummary::default();
                    s.source = None;
                    s.last_error = Some(e.clone());
                    s.last_outcome = Some(Outcome::Failed);
                    s.attempts = attempts;
                    s.fetched_at = None;
                    s.status = Status::Idle;
                });
                Err(e.into())
            }
        }
    }

    /// Drop the current results and error.
    pub fn clear(&self) -> Result<(), PipelineError> {
        let cleared = self.state.send_if_modified(|s| {
            if s.status == Status::Fetching {
                return false;
            }
            *s = PipelineSnapshot::default();
            true
        });

        if cleared {
            Ok(())
        } else {
            Err(PipelineError::Busy)
        }
    }
}

/// Returns the pipeline to `Idle` if a running fetch is dropped before it
/// records an outcome. Results and error from before the fetch are kept.
struct FetchGuard<'a> {
    state: &'a watch::Sender<PipelineSnapshot>,
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        let abandoned = self.state.send_if_modified(|s| {
            if s.status == Status::Fetching {
                s.status = Status::Idle;
                true
            } else {
                false
            }
        });
        if abandoned {
            warn!("Fetch dropped before completing; pipeline is idle again");
        }
    }
}

/// Split raw input into trimmed, non-blank reviews.
pub fn prepare_reviews(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}
