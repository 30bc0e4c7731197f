//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Upstream response headers:
//!     → headers.rs (strip embedding-hostile, hop-by-hop and body headers)
//!     → headers.rs (add permissive CORS and embedding headers)
//!     → Relayed to client
//! ```
//!
//! # Design Decisions
//! - Header policy is the only security boundary; content is not sandboxed
//! - Error responses get the same CORS headers as successful relays

pub mod headers;
