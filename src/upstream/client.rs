//! Outbound HTTP client.
//!
//! # Responsibilities
//! - Present browser-like request headers so origins do not treat the proxy
//!   as bot traffic
//! - Mirror method, body and the forwarded inbound headers
//! - Follow a bounded number of redirects
//! - Classify failures into [`FetchError`]
//!
//! # Design Decisions
//! - Any status below 500 is a successful fetch, so 4xx pages are still
//!   rewritten and rendered
//! - Accept-Encoding is left to reqwest, which decodes gzip/deflate/brotli

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, UPGRADE_INSECURE_REQUESTS};
use reqwest::{redirect, Client};

use crate::config::UpstreamConfig;
use crate::resilience::with_timeout;
use crate::upstream::types::{FetchError, ProxyRequest, UpstreamResponse};

/// Shared client for all upstream fetches.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
    timeout: Duration,
}

impl UpstreamClient {
    /// Build the client from configuration.
    pub fn new(config: &UpstreamConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, header_value(&config.accept)?);
        headers.insert(ACCEPT_LANGUAGE, header_value(&config.accept_language)?);
        headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .redirect(redirect::Policy::limited(config.max_redirects))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    /// Fetch one resource, bounded by the configured deadline.
    pub async fn fetch(&self, request: &ProxyRequest) -> Result<UpstreamResponse, FetchError> {
        with_timeout(self.timeout, self.send(request))
            .await
            .map_err(|_| FetchError::Timeout)?
    }

    async fn send(&self, request: &ProxyRequest) -> Result<UpstreamResponse, FetchError> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.target.clone())
            .headers(request.headers.clone());

        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;
        let status = response.status();

        if status.is_server_error() {
            return Err(FetchError::UpstreamStatus(status.as_u16()));
        }

        let final_url = response.url().clone();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        tracing::debug!(
            target_url = %request.target,
            final_url = %final_url,
            status = status.as_u16(),
            bytes = body.len(),
            "Upstream response received"
        );

        Ok(UpstreamResponse {
            status,
            headers,
            body,
            final_url,
        })
    }
}

fn header_value(value: &str) -> Result<HeaderValue, FetchError> {
    HeaderValue::from_str(value).map_err(|e| FetchError::Client(format!("invalid header value {value:?}: {e}")))
}
