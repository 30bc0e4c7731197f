//! Response relay and error mapping.
//!
//! # Responsibilities
//! - Build the client response from a rewritten upstream body
//! - Preserve the upstream status code
//! - Apply the header policy (strip hostile headers, add CORS/embedding)
//! - Map validation and fetch errors to status codes and JSON payloads
//!
//! # Error Mapping
//! ```text
//! ValidationError            → 400 { "error": "<message>" }
//! FetchError::Unreachable    → 404 { "error": "Website not found" }
//! FetchError::Timeout        → 504 { "error": "Request timeout" }
//! anything else              → 500 { "error": "Failed to fetch the website", "details": "<message>" }
//! ```

use axum::body::Body;
use axum::http::header::{HeaderValue, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::http::request::ValidationError;
use crate::rewrite::RewrittenBody;
use crate::security::headers::{apply_cors_headers, apply_embedding_headers, relayable_headers};
use crate::upstream::{FetchError, UpstreamResponse};

/// Any failure surfaced to the client.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Validation(_) => StatusCode::BAD_REQUEST,
            ProxyError::Fetch(FetchError::Unreachable(_)) => StatusCode::NOT_FOUND,
            ProxyError::Fetch(FetchError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::Fetch(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn payload(&self) -> serde_json::Value {
        match self {
            ProxyError::Validation(e) => json!({ "error": e.to_string() }),
            ProxyError::Fetch(FetchError::Unreachable(_)) => json!({ "error": "Website not found" }),
            ProxyError::Fetch(FetchError::Timeout) => json!({ "error": "Request timeout" }),
            ProxyError::Fetch(e) => json!({
                "error": "Failed to fetch the website",
                "details": e.to_string(),
            }),
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let mut response = (self.status(), Json(self.payload())).into_response();
        apply_cors_headers(response.headers_mut());
        response
    }
}

/// Relay a rewritten upstream response to the client.
pub fn relay(upstream: &UpstreamResponse, rewritten: RewrittenBody) -> Response {
    let mut headers = relayable_headers(&upstream.headers);
    match HeaderValue::from_str(&rewritten.content_type) {
        Ok(value) => {
            headers.insert(CONTENT_TYPE, value);
        }
        Err(_) => {
            tracing::debug!(content_type = %rewritten.content_type, "Unrepresentable content type dropped");
        }
    }
    apply_cors_headers(&mut headers);
    apply_embedding_headers(&mut headers);

    let mut response = Response::new(Body::from(rewritten.body));
    *response.status_mut() = upstream.status;
    *response.headers_mut() = headers;
    response
}

/// Response to a CORS preflight.
pub fn preflight() -> Response {
    let mut response = StatusCode::OK.into_response();
    apply_cors_headers(response.headers_mut());
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::HeaderMap;
    use bytes::Bytes;
    use url::Url;

    use crate::rewrite::ContentKind;

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_errors() {
        let response = ProxyError::from(ValidationError::MissingUrl).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        assert_eq!(json_body(response).await, json!({ "error": "URL parameter is required" }));

        let response = ProxyError::from(ValidationError::InvalidUrl).into_response();
        assert_eq!(json_body(response).await, json!({ "error": "Invalid URL format" }));
    }

    #[tokio::test]
    async fn test_fetch_errors() {
        let response = ProxyError::from(FetchError::Unreachable("dns error".into())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await, json!({ "error": "Website not found" }));

        let response = ProxyError::from(FetchError::Timeout).into_response();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(json_body(response).await, json!({ "error": "Request timeout" }));

        let response = ProxyError::from(FetchError::UpstreamStatus(503)).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(response).await,
            json!({
                "error": "Failed to fetch the website",
                "details": "upstream responded with status 503",
            })
        );
    }

    #[tokio::test]
    async fn test_relay_preserves_status_and_sets_policy_headers() {
        let mut upstream_headers = HeaderMap::new();
        upstream_headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
        upstream_headers.insert("content-type", HeaderValue::from_static("text/html"));
        upstream_headers.insert("cache-control", HeaderValue::from_static("no-store"));
        let upstream = UpstreamResponse {
            status: StatusCode::NOT_FOUND,
            headers: upstream_headers,
            body: Bytes::from_static(b"<p>missing</p>"),
            final_url: Url::parse("https://example.com/missing").unwrap(),
        };
        let rewritten = RewrittenBody {
            body: Bytes::from_static(b"<p>rewritten</p>"),
            content_type: "text/html; charset=utf-8".into(),
            kind: ContentKind::Html,
            references: 0,
        };

        let response = relay(&upstream, rewritten);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let headers = response.headers();
        assert_eq!(headers["content-type"], "text/html; charset=utf-8");
        assert_eq!(headers["cache-control"], "no-store");
        assert_eq!(headers["cross-origin-resource-policy"], "cross-origin");
        assert!(!headers.contains_key("x-frame-options"));

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"<p>rewritten</p>");
    }

    #[tokio::test]
    async fn test_preflight() {
        let response = preflight();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["access-control-allow-methods"], "GET, POST, PUT, DELETE, OPTIONS");
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());
    }
}
