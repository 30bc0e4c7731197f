//! Upstream fetch subsystem.
//!
//! # Data Flow
//! ```text
//! ProxyRequest (validated target, forwarded headers, body)
//!     → client.rs (browser-like headers, bounded redirects, deadline)
//!     → UpstreamResponse (status < 500, headers, decoded body, final URL)
//!     or FetchError (unreachable, timeout, upstream 5xx, other)
//! ```
//!
//! # Design Decisions
//! - One shared connection-pooled client for the whole process
//! - Body is buffered in full; rewriting needs the complete document
//! - Compression is negotiated and undone by the client before rewriting

pub mod client;
pub mod types;

pub use client::UpstreamClient;
pub use types::{FetchError, ProxyRequest, UpstreamResponse};
