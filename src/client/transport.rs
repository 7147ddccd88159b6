//! HTTP transport.
//!
//! The orchestrator talks to the scoring service through the [`Transport`]
//! trait. [`HttpTransport`] is the reqwest-backed implementation; tests
//! swap in a scripted one.

use crate::error::{FetchError, NetworkFailure};
use anyhow::{Context, Result};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// HTTP method used for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// A fully built request.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    /// JSON body, sent only with `POST`.
    pub body: Option<Value>,
}

/// A completed response, successful or not.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends a single request. No retries happen at this level.
pub trait Transport: Send + Sync {
    fn send<'a>(&'a self, request: &'a HttpRequest)
        -> BoxFuture<'a, Result<HttpResponse, FetchError>>;
}

/// reqwest-backed transport with a per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, timeout })
    }

    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, FetchError> {
        debug!("{:?} {}", request.method, request.url);

        let builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => {
                let builder = self.client.post(&request.url);
                match request.body {
                    Some(ref body) => builder.json(body),
                    None => builder,
                }
            }
        };

        let response = builder
            .send()
            .await
            .map_err(|e| self.classify(&request.url, e))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.classify(&request.url, e))?;

        debug!("{} answered {} ({} bytes)", request.url, status, body.len());

        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }

    fn classify(&self, url: &str, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Network {
                kind: NetworkFailure::Timeout,
                message: format!("Request to {} timed out after {}s", url, self.timeout.as_secs()),
            }
        } else if e.is_connect() {
            FetchError::Network {
                kind: NetworkFailure::Connect,
                message: format!("Cannot connect to analysis service at {}", url),
            }
        } else {
            FetchError::Network {
                kind: NetworkFailure::Request,
                message: format!("Failed to send request: {}", e),
            }
        }
    }
}

impl Transport for HttpTransport {
    fn send<'a>(
        &'a self,
        request: &'a HttpRequest,
    ) -> BoxFuture<'a, Result<HttpResponse, FetchError>> {
        self.execute(request).boxed()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned responses in order and records every request.
    #[derive(Default)]
    pub struct ScriptedTransport {
        script: Mutex<VecDeque<Result<HttpResponse, FetchError>>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedTransport {
        pub fn new(script: Vec<Result<HttpResponse, FetchError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl Transport for ScriptedTransport {
        fn send<'a>(
            &'a self,
            request: &'a HttpRequest,
        ) -> BoxFuture<'a, Result<HttpResponse, FetchError>> {
            self.requests.lock().unwrap().push(request.clone());
            let next = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(connection_refused()));
            futures::future::ready(next).boxed()
        }
    }

    pub fn ok(body: &str) -> Result<HttpResponse, FetchError> {
        Ok(HttpResponse {
            status: 200,
            body: body.as_bytes().to_vec(),
        })
    }

    pub fn status(status: u16, body: &str) -> Result<HttpResponse, FetchError> {
        Ok(HttpResponse {
            status,
            body: body.as_bytes().to_vec(),
        })
    }

    pub fn connection_refused() -> FetchError {
        FetchError::Network {
            kind: NetworkFailure::Connect,
            message: "Cannot connect to analysis service".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve exactly one request, returning its raw text from the handle.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 1024];

            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);

                let text = String::from_utf8_lossy(&raw).to_string();
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|l| {
                            let lower = l.to_ascii_lowercase();
                            lower
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap())
                        })
                        .unwrap_or(0);
                    if raw.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();

            String::from_utf8_lossy(&raw).to_string()
        });

        (format!("http://{}", addr), handle)
    }

    #[tokio::test]
    async fn test_get_request() {
        let (base, server) = serve_once("200 OK", "[]").await;
        let transport = HttpTransport::new(Duration::from_secs(5)).unwrap();

        let request = HttpRequest {
            method: Method::Get,
            url: format!("{}/load_data", base),
            body: None,
        };
        let response = transport.send(&request).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, b"[]");
        assert!(server.await.unwrap().starts_with("GET /load_data "));
    }

    #[tokio::test]
    async fn test_post_sends_json_body() {
        let (base, server) = serve_once("400 Bad Request", r#"{"error": "No reviews provided."}"#).await;
        let transport = HttpTransport::new(Duration::from_secs(5)).unwrap();

        let request = HttpRequest {
            method: Method::Post,
            url: format!("{}/analyze", base),
            body: Some(serde_json::json!({ "reviews": ["Great product!"] })),
        };
        let response = transport.send(&request).await.unwrap();

        assert_eq!(response.status, 400);
        assert!(!response.is_success());

        let raw = server.await.unwrap();
        assert!(raw.starts_with("POST /analyze "));
        assert!(raw.to_ascii_lowercase().contains("content-type: application/json"));
        assert!(raw.contains(r#"{"reviews":["Great product!"]}"#));
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = HttpTransport::new(Duration::from_secs(5)).unwrap();
        let request = HttpRequest {
            method: Method::Get,
            url: format!("http://{}/load_data", addr),
            body: None,
        };

        let err = transport.send(&request).await.unwrap_err();
        assert!(matches!(
            err,
            FetchError::Network {
                kind: NetworkFailure::Connect,
                ..
            }
        ));
    }
}
