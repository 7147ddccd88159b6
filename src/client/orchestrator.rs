//! Request orchestration against the scoring service.
//!
//! One logical fetch = up to `max_attempts` independent attempts, each of
//! which sends the request, checks the status, validates the body and
//! ranks the results. Only the last failure is surfaced.

use crate::analysis::{rank, validate};
use crate::client::transport::{HttpRequest, HttpResponse, Method, Transport};
use crate::error::FetchError;
use crate::models::{FetchSource, ResultCollection};
use crate::retry::{Retried, RetryPolicy};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

/// What to ask the scoring service for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchRequest {
    /// Score free-text reviews (`POST /analyze`).
    Analyze { reviews: Vec<String> },
    /// Score the stored dataset (`GET /load_data`).
    LoadData,
}

impl FetchRequest {
    pub fn source(&self) -> FetchSource {
        match self {
            FetchRequest::Analyze { .. } => FetchSource::FreeText,
            FetchRequest::LoadData => FetchSource::Dataset,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            FetchRequest::Analyze { .. } => "/analyze",
            FetchRequest::LoadData => "/load_data",
        }
    }

    /// Build the HTTP request: `GET` without a payload, `POST` with one.
    pub fn to_http(&self, base_url: &str) -> HttpRequest {
        let url = format!("{}{}", base_url, self.path());
        match self {
            FetchRequest::Analyze { reviews } => HttpRequest {
                method: Method::Post,
                url,
                body: Some(json!({ "reviews": reviews })),
            },
            FetchRequest::LoadData => HttpRequest {
                method: Method::Get,
                url,
                body: None,
            },
        }
    }
}

/// A validated, ranked collection and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    pub results: ResultCollection,
    pub source: FetchSource,
}

/// Error payload the service sends with non-success statuses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Issues requests with bounded retries.
pub struct Orchestrator<T: Transport> {
    transport: T,
    base_url: String,
    policy: RetryPolicy,
}

impl<T: Transport> Orchestrator<T> {
    pub fn new(transport: T, base_url: impl Into<String>, policy: RetryPolicy) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            transport,
            base_url,
            policy,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetch, validate and rank results, retrying failed attempts.
    pub async fn fetch_results(&self, request: &FetchRequest) -> Result<FetchOutcome, FetchError> {
        self.fetch(request).await.result
    }

    /// Like [`fetch_results`](Self::fetch_results), also reporting how many
    /// attempts were made.
    pub async fn fetch(&self, request: &FetchRequest) -> Retried<FetchOutcome, FetchError> {
        let http = request.to_http(&self.base_url);
        info!("Fetching {} from {}", request.source(), http.url);

        let retried = self.policy.run(|_| self.attempt(&http)).await;

        match retried.result {
            Ok(results) => {
                info!(
                    "Received {} results after {} attempt(s)",
                    results.len(),
                    retried.attempts
                );
                Retried {
                    result: Ok(FetchOutcome {
                        results,
                        source: request.source(),
                    }),
                    attempts: retried.attempts,
                }
            }
            Err(e) => {
                error!("Fetch failed after {} attempt(s): {}", retried.attempts, e);
                Retried {
                    result: Err(e),
                    attempts: retried.attempts,
                }
            }
        }
    }

    async fn attempt(&self, http: &HttpRequest) -> Result<ResultCollection, FetchError> {
        let response = self.transport.send(http).await?;

        if !response.is_success() {
            return Err(FetchError::Http {
                status: response.status,
                message: error_message(&response),
            });
        }

        let collection = validate(&response.body)?;
        Ok(rank(collection))
    }
}

/// Message from an `{"error": ...}` body, or one derived from the status.
fn error_message(response: &HttpResponse) -> String {
    serde_json::from_slice::<ErrorBody>(&response.body)
        .map(|body| body.error)
        .unwrap_or_else(|_| format!("HTTP error! status: {}", response.status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::transport::testing::{connection_refused, ok, status, ScriptedTransport};
    use crate::error::ValidationError;
    use std::time::Duration;

    const TWO_RESULTS: &str = r#"[
        {"id": 1, "review": "Terrible quality", "sentiment": "Negative", "compound_score": -0.6},
        {"id": 2, "review": "Great product!", "sentiment": "Positive", "compound_score": 0.8}
    ]"#;

    fn orchestrator(script: Vec<Result<HttpResponse, FetchError>>) -> Orchestrator<ScriptedTransport> {
        Orchestrator::new(
            ScriptedTransport::new(script),
            "http://localhost:5000/",
            RetryPolicy::default(),
        )
    }

    #[test]
    fn test_build_requests() {
        let analyze = FetchRequest::Analyze {
            reviews: vec!["Great product!".to_string()],
        };
        let http = analyze.to_http("http://svc");
        assert_eq!(http.method, Method::Post);
        assert_eq!(http.url, "http://svc/analyze");
        assert_eq!(http.body, Some(json!({ "reviews": ["Great product!"] })));
        assert_eq!(analyze.source(), FetchSource::FreeText);

        let load = FetchRequest::LoadData.to_http("http://svc");
        assert_eq!(load.method, Method::Get);
        assert_eq!(load.url, "http://svc/load_data");
        assert_eq!(load.body, None);
        assert_eq!(FetchRequest::LoadData.source(), FetchSource::Dataset);
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let orch = orchestrator(vec![]);
        assert_eq!(orch.base_url(), "http://localhost:5000");
    }

    #[test]
    fn test_error_message_from_body() {
        let response = HttpResponse {
            status: 404,
            body: br#"{"error": "sample_reviews.csv not found."}"#.to_vec(),
        };
        assert_eq!(error_message(&response), "sample_reviews.csv not found.");

        let response = HttpResponse {
            status: 502,
            body: b"Bad Gateway".to_vec(),
        };
        assert_eq!(error_message(&response), "HTTP error! status: 502");
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_is_ranked() {
        let orch = orchestrator(vec![ok(TWO_RESULTS)]);
        let request = FetchRequest::Analyze {
            reviews: vec!["Great product!".to_string(), "Terrible quality".to_string()],
        };

        let retried = orch.fetch(&request).await;

        assert_eq!(retried.attempts, 1);
        let outcome = retried.result.unwrap();
        assert_eq!(outcome.source, FetchSource::FreeText);
        let scores: Vec<f64> = outcome.results.iter().map(|r| r.compound_score).collect();
        assert_eq!(scores, vec![0.8, -0.6]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_network_failures() {
        let single = r#"[{"id": 1, "review": "ok", "sentiment": "Neutral", "compound_score": 0.0}]"#;
        let orch = orchestrator(vec![
            Err(connection_refused()),
            Err(connection_refused()),
            ok(single),
        ]);

        let retried = orch.fetch(&FetchRequest::LoadData).await;

        assert_eq!(retried.attempts, 3);
        assert_eq!(retried.result.unwrap().results.len(), 1);
        assert_eq!(orch.transport().requests().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_failing_stops_at_three_attempts() {
        let started = tokio::time::Instant::now();
        let orch = orchestrator(vec![
            status(500, "oops"),
            status(500, "oops"),
            status(500, "oops"),
            ok(TWO_RESULTS),
        ]);

        let retried = orch.fetch(&FetchRequest::LoadData).await;

        assert_eq!(retried.attempts, 3);
        assert_eq!(orch.transport().requests().len(), 3);
        assert_eq!(
            retried.result.unwrap_err(),
            FetchError::Http {
                status: 500,
                message: "HTTP error! status: 500".to_string()
            }
        );
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(3) && elapsed < Duration::from_millis(3100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_array_is_validation_error() {
        let body = r#"{"results": []}"#;
        let orch = orchestrator(vec![ok(body), ok(body), ok(body)]);

        let err = orch.fetch_results(&FetchRequest::LoadData).await.unwrap_err();

        assert_eq!(
            err,
            FetchError::Validation(ValidationError::NotAnArray { found: "object" })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_validation_failure_is_retried() {
        let orch = orchestrator(vec![ok("not json"), ok(TWO_RESULTS)]);

        let retried = orch.fetch(&FetchRequest::LoadData).await;

        assert_eq!(retried.attempts, 2);
        tokio_test::assert_ok!(retried.result);
    }
}
