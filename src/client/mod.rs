//! Client for the remote scoring service.
//!
//! This module provides the transport seam and the retrying orchestrator.

pub mod orchestrator;
pub mod transport;

pub use orchestrator::{FetchOutcome, FetchRequest, Orchestrator};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, Method, Transport};
