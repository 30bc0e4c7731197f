//! Rewriting forward proxy library.
//!
//! Fetches a remote resource, rewrites every reference inside HTML and CSS so
//! follow-on requests flow back through the proxy, injects a client-side
//! runtime patch for URLs created after page load, and relays the result
//! with embedding-hostile headers removed.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod rewrite;
pub mod security;
pub mod upstream;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
