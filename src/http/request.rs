//! Request handling and validation.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) for every inbound request
//! - Extract and validate the target URL from the query string
//! - Collect the inbound body and the headers forwarded upstream
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Validation happens before any upstream call is made
//! - No body-size limit: uploads are relayed whatever their size

use axum::body::{to_bytes, Body};
use axum::http::header::{HeaderMap, CONTENT_TYPE, RANGE};
use axum::http::{HeaderValue, Request};
use thiserror::Error;
use tower_http::request_id::{MakeRequestId, RequestId};
use url::Url;
use uuid::Uuid;

use crate::upstream::ProxyRequest;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Request ID of an inbound request, `"unknown"` when absent.
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

/// A request the proxy refuses before contacting any upstream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("URL parameter is required")]
    MissingUrl,

    #[error("Invalid URL format")]
    InvalidUrl,

    #[error("Invalid request body")]
    InvalidBody,
}

/// Read the target URL from a query string.
///
/// Returns the parsed URL and the decoded parameter value as supplied.
pub fn target_from_query(query: Option<&str>, param: &str) -> Result<(Url, String), ValidationError> {
    let raw = query
        .and_then(|query| {
            url::form_urlencoded::parse(query.as_bytes())
                .find(|(key, _)| key == param)
                .map(|(_, value)| value.into_owned())
        })
        .filter(|value| !value.trim().is_empty())
        .ok_or(ValidationError::MissingUrl)?;

    let target = Url::parse(raw.trim()).map_err(|_| ValidationError::InvalidUrl)?;
    if !matches!(target.scheme(), "http" | "https") || target.host_str().is_none() {
        return Err(ValidationError::InvalidUrl);
    }

    Ok((target, raw))
}

/// Turn an inbound request into a validated [`ProxyRequest`].
pub async fn extract_proxy_request(request: Request<Body>, param: &str) -> Result<ProxyRequest, ValidationError> {
    let (parts, body) = request.into_parts();
    let (target, request_url) = target_from_query(parts.uri.query(), param)?;

    let body = to_bytes(body, usize::MAX)
        .await
        .map_err(|_| ValidationError::InvalidBody)?;

    // Only the body type and byte ranges are forwarded; cookies and
    // credentials belong to the proxy's origin, not the target's.
    let mut headers = HeaderMap::new();
    for name in [CONTENT_TYPE, RANGE] {
        if name == CONTENT_TYPE && body.is_empty() {
            continue;
        }
        if let Some(value) = parts.headers.get(&name) {
            headers.insert(name, value.clone());
        }
    }

    Ok(ProxyRequest {
        method: parts.method,
        target,
        request_url,
        headers,
        body: (!body.is_empty()).then_some(body),
    })
}
