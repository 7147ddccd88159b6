//! Error types for the fetch pipeline.

use std::fmt;
use thiserror::Error;

/// Broad classification of a fetch failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request never completed.
    Network,
    /// The service answered with a non-success status.
    Http,
    /// The service answered, but the payload had the wrong shape.
    Validation,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Network => "network",
            ErrorKind::Http => "http",
            ErrorKind::Validation => "validation",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a request could not complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkFailure {
    /// Connection refused, DNS failure, rejected by policy.
    Connect,
    /// The per-attempt timeout elapsed.
    Timeout,
    /// Any other transport-level failure.
    Request,
}

/// Payload did not match the expected result shape.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("response is not valid JSON: {0}")]
    Malformed(String),

    #[error("expected an array of results, got {found}")]
    NotAnArray { found: &'static str },

    #[error("result #{index} is not an object")]
    NotAnObject { index: usize },

    #[error("result #{index} has an invalid compound_score: {reason}")]
    InvalidScore { index: usize, reason: String },

    #[error("result #{index} is malformed: {reason}")]
    InvalidRecord { index: usize, reason: String },

    #[error("duplicate result id {id}")]
    DuplicateId { id: u64 },
}

/// A failed fetch attempt, or the terminal failure of a fetch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    #[error("{message}")]
    Network {
        kind: NetworkFailure,
        message: String,
    },

    #[error("{message}")]
    Http { status: u16, message: String },

    #[error("invalid response: {0}")]
    Validation(#[from] ValidationError),
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::Network { .. } => ErrorKind::Network,
            FetchError::Http { .. } => ErrorKind::Http,
            FetchError::Validation(_) => ErrorKind::Validation,
        }
    }

    /// A hint for the user on what to check next.
    pub fn guidance(&self) -> &'static str {
        match self {
            FetchError::Network {
                kind: NetworkFailure::Timeout,
                ..
            } => "The analysis service did not answer in time. It may be overloaded; try again shortly.",
            FetchError::Network { .. } => {
                "Could not reach the analysis service. Check that it is running, that the base URL is correct, and that it accepts requests from this client."
            }
            FetchError::Http { status, .. } if *status >= 500 => {
                "The analysis service failed while processing the request. Check the service logs."
            }
            FetchError::Http { .. } => {
                "The analysis service rejected the request. Check the submitted reviews."
            }
            FetchError::Validation(_) => {
                "The analysis service returned data in an unexpected format. Check that the base URL points at a compatible service."
            }
        }
    }
}

/// Errors surfaced by the pipeline controller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error("a fetch is already in progress")]
    Busy,

    #[error("no reviews to analyze")]
    NoReviews,

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind() {
        let network = FetchError::Network {
            kind: NetworkFailure::Connect,
            message: "refused".to_string(),
        };
        let http = FetchError::Http {
            status: 500,
            message: "boom".to_string(),
        };
        let validation = FetchError::from(ValidationError::NotAnArray { found: "object" });

        assert_eq!(network.kind(), ErrorKind::Network);
        assert_eq!(http.kind(), ErrorKind::Http);
        assert_eq!(validation.kind(), ErrorKind::Validation);
        assert_eq!(validation.kind().to_string(), "validation");
    }

    #[test]
    fn test_guidance_distinguishes_network_from_http() {
        let network = FetchError::Network {
            kind: NetworkFailure::Connect,
            message: "refused".to_string(),
        };
        let http = FetchError::Http {
            status: 400,
            message: "No reviews provided.".to_string(),
        };

        assert_ne!(network.guidance(), http.guidance());
        assert!(network.guidance().contains("reach"));
    }

    #[test]
    fn test_display_messages() {
        let err = FetchError::from(ValidationError::NotAnArray { found: "object" });
        assert_eq!(
            err.to_string(),
            "invalid response: expected an array of results, got object"
        );

        let err = PipelineError::from(FetchError::Http {
            status: 500,
            message: "HTTP error! status: 500".to_string(),
        });
        assert_eq!(err.to_string(), "HTTP error! status: 500");
    }
}
