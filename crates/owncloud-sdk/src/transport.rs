// ──────────────────────────────────────────────────────────────────────────────
// owncloud-sdk · transport
// ──────────────────────────────────────────────────────────────────────────────
// The HTTP seam every request goes through:
//  • `HttpTransport` trait (one request in, status + headers + body out)
//  • `ReqwestTransport`, the default implementation, with an opt-in retry
//    loop (429 honouring Retry-After, 5xx, connect failures)
// Status codes are never judged here; classification happens in `client`.
// ──────────────────────────────────────────────────────────────────────────────

use crate::config::TransportOptions;
use crate::error::{OcError, OcResult};
use async_trait::async_trait;
use bytes::Bytes;
use log::{debug, warn};
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, StatusCode};
use std::time::Duration;

const INITIAL_BACKOFF_MS: u64 = 500;
const MAX_BACKOFF_MS: u64 = 30_000;

// ── Request / Response ───────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl TransportRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Header value as text, mostly for tests and logging.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[derive(Debug, Clone, Default)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Body as UTF-8 text (lossy).
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Sends one HTTP request. Implementations report network failures as
/// `OcError::Network` and return every HTTP status unjudged.
#[async_trait]
pub trait HttpTransport: Send + Sync + std::fmt::Debug {
    async fn execute(&self, request: TransportRequest) -> OcResult<TransportResponse>;
}

// ── ReqwestTransport ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: Client,
    max_retries: u32,
}

impl ReqwestTransport {
    pub fn new(options: &TransportOptions) -> OcResult<Self> {
        let mut builder = Client::builder().timeout(Duration::from_secs(options.timeout_secs));
        if let Some(agent) = &options.user_agent {
            builder = builder.user_agent(agent.as_str());
        }
        Ok(Self {
            http: builder.build()?,
            max_retries: options.max_retries,
        })
    }

    /// Wrap a pre-configured client.
    pub fn with_client(http: Client, max_retries: u32) -> Self {
        Self { http, max_retries }
    }

    async fn send_with_retry(&self, request: reqwest::Request) -> OcResult<reqwest::Response> {
        let mut attempt = 0u32;

        loop {
            let cloned = request
                .try_clone()
                .ok_or_else(|| OcError::InvalidConfig("request body is not clonable".into()))?;

            match self.http.execute(cloned).await {
                Ok(resp) => {
                    let status = resp.status();
                    let retryable =
                        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
                    if !retryable || attempt >= self.max_retries {
                        return Ok(resp);
                    }
                    let wait = if status == StatusCode::TOO_MANY_REQUESTS {
                        retry_after_ms(resp.headers(), attempt)
                    } else {
                        backoff_ms(attempt)
                    };
                    warn!(
                        "{} from {}, retrying in {}ms (attempt {})",
                        status,
                        request.url(),
                        wait,
                        attempt + 1
                    );
                    tokio::time::sleep(Duration::from_millis(wait)).await;
                }
                Err(e) => {
                    if !e.is_connect() || attempt >= self.max_retries {
                        return Err(e.into());
                    }
                    let wait = backoff_ms(attempt);
                    warn!("connect error, retrying in {}ms: {}", wait, e);
                    tokio::time::sleep(Duration::from_millis(wait)).await;
                }
            }
            attempt += 1;
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: TransportRequest) -> OcResult<TransportResponse> {
        debug!("{} {}", request.method, request.url);

        let mut builder = self
            .http
            .request(request.method, &request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let resp = self.send_with_retry(builder.build()?).await?;
        let status = resp.status().as_u16();
        let headers = resp.headers().clone();
        let body = resp
            .bytes()
            .await
            .map_err(|e| OcError::Network(format!("read body: {}", e)))?;

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}

// ── Free-standing helpers ────────────────────────────────────────────────────

fn backoff_ms(attempt: u32) -> u64 {
    INITIAL_BACKOFF_MS
        .saturating_mul(2u64.saturating_pow(attempt))
        .min(MAX_BACKOFF_MS)
}

fn retry_after_ms(headers: &HeaderMap, attempt: u32) -> u64 {
    headers
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(|s| s.saturating_mul(1000).min(MAX_BACKOFF_MS))
        .unwrap_or_else(|| backoff_ms(attempt))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
