//! Outbound HTTP with classified failures and an explicit per-verb retry
//! policy.
//!
//! All network access goes through [`FetchClient`]. Failures are classified
//! as [`FetchError::Status`] (non-2xx response) or [`FetchError::Transport`]
//! (network/timeout); callers treat either as "no data" and continue — a
//! failed fetch never aborts a harvest run.
//!
//! # Retry
//!
//! The retry policy is an explicit value parameterized by verb: by default
//! GET is attempted exactly once and POST three times at a fixed one-second
//! delay. Both are configuration knobs, not hidden behavior.
//!
//! # Rendered pages
//!
//! Sources whose pages are assembled by script are fetched through a
//! content-hash stabilization loop: the page is polled until two consecutive
//! payloads hash identically, bounded by a maximum wait. The last payload is
//! used if the page never settles.

use crate::config::HttpConfig;
use crate::utils::random_user_agent;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, error, warn};

/// A classified fetch failure.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The server answered with a non-2xx status.
    #[error("request failed with status {code}")]
    Status { code: u16 },
    /// The request never produced a usable response (connect, timeout, body
    /// read, TLS).
    #[error("transport error: {source}")]
    Transport {
        #[from]
        source: reqwest::Error,
    },
}

/// HTTP verb for a [`FetchRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Get,
    Post,
}

/// One outbound request: verb, url, query params, optional JSON body,
/// extra headers and cookies, and whether the rendered-fetch path applies.
#[derive(Debug, Clone, Default)]
pub struct FetchRequest {
    pub method: Method,
    pub url: String,
    pub params: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    pub headers: Vec<(String, String)>,
    pub cookies: Vec<(String, String)>,
    pub rendered: bool,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>) -> Self {
        FetchRequest {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn post(url: impl Into<String>, body: serde_json::Value) -> Self {
        FetchRequest {
            method: Method::Post,
            url: url.into(),
            body: Some(body),
            ..Default::default()
        }
    }

    pub fn with_params(mut self, params: Vec<(String, String)>) -> Self {
        self.params = params;
        self
    }

    pub fn rendered(mut self) -> Self {
        self.rendered = true;
        self
    }
}

/// Fixed-delay retry policy for one verb.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first (minimum 1).
    pub attempts: u32,
    /// Fixed delay between attempts.
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        RetryPolicy {
            attempts: attempts.max(1),
            delay,
        }
    }
}

/// Seam between the pipeline and the network, so orchestration is testable
/// without sockets.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Issue the request and return the response body.
    async fn fetch(&self, req: FetchRequest) -> Result<String, FetchError>;
}

/// Shared HTTP client: one `reqwest::Client` with a global timeout,
/// redirect following, a rotating User-Agent, and per-verb retry.
pub struct FetchClient {
    client: reqwest::Client,
    get_retry: RetryPolicy,
    post_retry: RetryPolicy,
    render_poll: Duration,
    render_max_wait: Duration,
}

impl FetchClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns the underlying builder error if the TLS backend cannot be
    /// initialized.
    pub fn new(cfg: &HttpConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        let delay = Duration::from_secs(cfg.retry_delay_secs);
        Ok(FetchClient {
            client,
            get_retry: RetryPolicy::new(cfg.get_attempts, delay),
            post_retry: RetryPolicy::new(cfg.post_attempts, delay),
            render_poll: Duration::from_millis(cfg.render_poll_ms),
            render_max_wait: Duration::from_secs(cfg.render_max_wait_secs),
        })
    }

    fn policy_for(&self, method: Method) -> RetryPolicy {
        match method {
            Method::Get => self.get_retry,
            Method::Post => self.post_retry,
        }
    }

    async fn send_once(&self, req: &FetchRequest) -> Result<String, FetchError> {
        let mut builder = match req.method {
            Method::Get => self.client.get(&req.url),
            Method::Post => self.client.post(&req.url),
        };
        if !req.params.is_empty() {
            builder = builder.query(&req.params);
        }
        builder = builder.header(reqwest::header::USER_AGENT, random_user_agent());
        for (name, value) in &req.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !req.cookies.is_empty() {
            let cookie = req
                .cookies
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("; ");
            builder = builder.header(reqwest::header::COOKIE, cookie);
        }
        if let Some(body) = &req.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                code: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }

    async fn send_with_retry(&self, req: &FetchRequest) -> Result<String, FetchError> {
        let policy = self.policy_for(req.method);
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.send_once(req).await {
                Ok(body) => {
                    debug!(url = %req.url, attempt, bytes = body.len(), "fetch succeeded");
                    return Ok(body);
                }
                Err(e) => {
                    if attempt >= policy.attempts {
                        error!(url = %req.url, attempt, error = %e, "fetch exhausted retries");
                        return Err(e);
                    }
                    warn!(
                        url = %req.url,
                        attempt,
                        max = policy.attempts,
                        delay = ?policy.delay,
                        error = %e,
                        "fetch attempt failed; retrying"
                    );
                    sleep(policy.delay).await;
                }
            }
        }
    }

    /// Poll a script-rendered page until its body hash stops changing.
    ///
    /// Readiness predicate: two consecutive polls with identical payload
    /// hashes. Bounded by `render_max_wait`; the last payload wins on
    /// timeout.
    async fn fetch_stable(&self, req: &FetchRequest) -> Result<String, FetchError> {
        let deadline = Instant::now() + self.render_max_wait;
        let mut prev: Option<(String, Vec<u8>)> = None;
        let mut last_err: Option<FetchError> = None;

        loop {
            match self.send_once(req).await {
                Ok(body) => {
                    let digest = Sha256::digest(body.as_bytes()).to_vec();
                    if let Some((_, prev_digest)) = &prev {
                        if *prev_digest == digest {
                            debug!(url = %req.url, bytes = body.len(), "rendered page stabilized");
                            return Ok(body);
                        }
                    }
                    prev = Some((body, digest));
                }
                Err(e) => {
                    warn!(url = %req.url, error = %e, "rendered fetch poll failed");
                    last_err = Some(e);
                }
            }

            if Instant::now() + self.render_poll >= deadline {
                if let Some((body, _)) = prev {
                    warn!(url = %req.url, "rendered page did not stabilize before max wait; using last payload");
                    return Ok(body);
                }
                if let Some(e) = last_err {
                    return Err(e);
                }
                return self.send_once(req).await;
            }
            sleep(self.render_poll).await;
        }
    }
}

#[async_trait]
impl Fetch for FetchClient {
    async fn fetch(&self, req: FetchRequest) -> Result<String, FetchError> {
        if req.rendered {
            self.fetch_stable(&req).await
        } else {
            self.send_with_retry(&req).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn test_config() -> HttpConfig {
        HttpConfig {
            timeout_secs: 5,
            get_attempts: 1,
            post_attempts: 3,
            retry_delay_secs: 0,
            render_poll_ms: 10,
            render_max_wait_secs: 2,
        }
    }

    /// Minimal HTTP server answering every request with a fixed response.
    /// Returns the base url and a hit counter.
    async fn spawn_server(response: &'static str) -> (String, Arc<AtomicUsize>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                counter.fetch_add(1, Ordering::SeqCst);
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        (format!("http://{addr}/"), hits)
    }

    const OK: &str = "HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\nok";
    const SERVER_ERROR: &str =
        "HTTP/1.1 500 Internal Server Error\r\ncontent-length: 0\r\nconnection: close\r\n\r\n";

    #[test]
    fn test_retry_policy_minimum_one_attempt() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).attempts, 1);
        assert_eq!(RetryPolicy::new(3, Duration::from_secs(1)).attempts, 3);
    }

    #[tokio::test]
    async fn test_get_succeeds() {
        let (url, hits) = spawn_server(OK).await;
        let client = FetchClient::new(&test_config()).unwrap();
        let body = client.fetch(FetchRequest::get(url.as_str())).await.unwrap();
        assert_eq!(body, "ok");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_get_status_error_not_retried() {
        let (url, hits) = spawn_server(SERVER_ERROR).await;
        let client = FetchClient::new(&test_config()).unwrap();
        let err = client.fetch(FetchRequest::get(url.as_str())).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { code: 500 }));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_post_retried_three_times() {
        let (url, hits) = spawn_server(SERVER_ERROR).await;
        let client = FetchClient::new(&test_config()).unwrap();
        let req = FetchRequest::post(url.as_str(), serde_json::json!({"page": 1}));
        let err = client.fetch(req).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { code: 500 }));
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_transport_error_classification() {
        // Nothing listens on this port.
        let client = FetchClient::new(&test_config()).unwrap();
        let err = client
            .fetch(FetchRequest::get("http://127.0.0.1:1/"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Transport { .. }));
    }

    #[tokio::test]
    async fn test_rendered_fetch_stabilizes() {
        let (url, hits) = spawn_server(OK).await;
        let client = FetchClient::new(&test_config()).unwrap();
        let body = client.fetch(FetchRequest::get(url.as_str()).rendered()).await.unwrap();
        assert_eq!(body, "ok");
        // Identical payloads: exactly two polls needed.
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }
}
