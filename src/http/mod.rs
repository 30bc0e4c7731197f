//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → request.rs (validate target URL, collect body and forwarded headers)
//!     → upstream::UpstreamClient (fetch)
//!     → rewrite::rewrite_response (HTML / CSS / passthrough)
//!     → response.rs (relay with header policy, or error payload)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuid, ValidationError, X_REQUEST_ID};
pub use response::ProxyError;
pub use server::HttpServer;
