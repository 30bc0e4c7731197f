//! Request and response types exchanged with upstream origins.

use std::error::Error as _;

use bytes::Bytes;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use thiserror::Error;
use url::Url;

use crate::rewrite::media::OCTET_STREAM;

/// A validated request to fetch one resource through the proxy.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub method: Method,
    /// Absolute http(s) URL of the resource.
    pub target: Url,
    /// Target exactly as the client supplied it.
    pub request_url: String,
    /// Inbound headers that are forwarded upstream.
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl ProxyRequest {
    pub fn new(method: Method, target: Url) -> Self {
        Self {
            request_url: target.to_string(),
            method,
            target,
            headers: HeaderMap::new(),
            body: None,
        }
    }
}

/// A response the proxy will relay (status below 500).
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Decoded body bytes.
    pub body: Bytes,
    /// Location of the resource after redirects.
    pub final_url: Url,
}

impl UpstreamResponse {
    /// The raw `Content-Type` header, if present and readable.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// Declared media type, `application/octet-stream` when absent.
    pub fn media_type(&self) -> &str {
        self.content_type().unwrap_or(OCTET_STREAM)
    }
}

/// Failure to obtain a relayable upstream response.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection refused, DNS failure and similar.
    #[error("upstream unreachable: {0}")]
    Unreachable(String),

    /// The fetch exceeded its deadline.
    #[error("upstream request timed out")]
    Timeout,

    /// The upstream answered with a server error.
    #[error("upstream responded with status {0}")]
    UpstreamStatus(u16),

    /// Any other failure while talking to the upstream.
    #[error("{0}")]
    Request(String),

    /// The HTTP client could not be constructed.
    #[error("failed to build upstream client: {0}")]
    Client(String),
}

impl FetchError {
    /// Label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Unreachable(_) => "unreachable",
            FetchError::Timeout => "timeout",
            FetchError::UpstreamStatus(_) => "upstream_status",
            FetchError::Request(_) => "request",
            FetchError::Client(_) => "client",
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_connect() || is_dns_failure(&err) {
            FetchError::Unreachable(error_chain(&err))
        } else if err.is_redirect() {
            FetchError::Request(format!("too many redirects: {err}"))
        } else {
            FetchError::Request(error_chain(&err))
        }
    }
}

fn is_dns_failure(err: &reqwest::Error) -> bool {
    let message = error_chain(err).to_ascii_lowercase();
    message.contains("dns error") || message.contains("failed to lookup address")
}

/// The error and all of its sources, joined with `: `.
fn error_chain(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
