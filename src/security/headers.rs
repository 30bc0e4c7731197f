//! Response header policy.
//!
//! # Responsibilities
//! - Drop upstream headers that block cross-origin embedding
//! - Drop hop-by-hop, encoding and cookie headers that cannot be relayed
//! - Add permissive CORS and embedding headers to every proxy response
//!
//! # Design Decisions
//! - Removing CSP, X-Frame-Options and friends deliberately overrides the
//!   origin's stated policy; the proxy is the access boundary
//! - The body is decoded and possibly rewritten, so encoding and length
//!   headers from upstream are never valid for the relayed body

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};

/// Headers that actively prevent a page from being rendered through the proxy.
pub const EMBEDDING_HOSTILE: &[&str] = &[
    "content-security-policy",
    "content-security-policy-report-only",
    "x-frame-options",
    "x-content-type-options",
    "referrer-policy",
];

/// Connection-level headers (RFC 9110 §7.6.1).
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Headers describing the upstream body or session, not the relayed one.
const NOT_RELAYED: &[&str] = &[
    "content-encoding",
    "content-length",
    "content-type",
    "set-cookie",
    "strict-transport-security",
];

pub const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";

/// Copy relayable upstream headers, leaving out everything the relay
/// strips or overrides.
pub fn relayable_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut relayed = HeaderMap::with_capacity(upstream.len());
    for (name, value) in upstream {
        if is_relayable(name) {
            relayed.append(name.clone(), value.clone());
        }
    }
    relayed
}

fn is_relayable(name: &HeaderName) -> bool {
    let name = name.as_str();
    !(EMBEDDING_HOSTILE.contains(&name)
        || HOP_BY_HOP.contains(&name)
        || NOT_RELAYED.contains(&name)
        || name.starts_with("access-control-")
        || name.starts_with("cross-origin-"))
}

/// Permissive CORS headers.
pub fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("*"));
}

/// Headers allowing the relayed content to be embedded anywhere.
pub fn apply_embedding_headers(headers: &mut HeaderMap) {
    headers.insert(
        HeaderName::from_static("cross-origin-embedder-policy"),
        HeaderValue::from_static("unsafe-none"),
    );
    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("unsafe-none"),
    );
    headers.insert(
        HeaderName::from_static("cross-origin-resource-policy"),
        HeaderValue::from_static("cross-origin"),
    );
}
