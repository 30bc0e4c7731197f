//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the rewriting proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Public proxy endpoint (path and query parameter of proxied references).
    pub endpoint: EndpointConfig,

    /// Outbound fetch settings.
    pub upstream: UpstreamConfig,

    /// Content rewriting switches.
    pub rewrite: RewriteConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// The proxy's own endpoint.
///
/// Every proxied reference has the form `<path>?<query_param>=<encoded url>`,
/// so these two values are the single source of the reference prefix used by
/// the server-side rewriters and the injected runtime patch.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Path the proxy handler is mounted on.
    pub path: String,

    /// Query parameter carrying the target URL.
    pub query_param: String,

    /// Host (with optional port) the proxy is reachable under.
    /// Empty means "use the inbound Host header".
    pub public_host: String,
}

impl EndpointConfig {
    /// The prefix every proxied reference starts with, e.g. `/proxy?url=`.
    pub fn reference_prefix(&self) -> String {
        format!("{}?{}=", self.path, self.query_param)
    }

    /// Configured public host, if any.
    pub fn public_host(&self) -> Option<&str> {
        let host = self.public_host.trim();
        (!host.is_empty()).then_some(host)
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            path: "/proxy".to_string(),
            query_param: "url".to_string(),
            public_host: String::new(),
        }
    }
}

/// Outbound request configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Total deadline for one upstream fetch (headers and body) in seconds.
    pub timeout_secs: u64,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Maximum number of redirects followed before failing.
    pub max_redirects: usize,

    /// User-Agent presented to upstream sites.
    pub user_agent: String,

    /// Accept header presented to upstream sites.
    pub accept: String,

    /// Accept-Language header presented to upstream sites.
    pub accept_language: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            connect_timeout_secs: 10,
            max_redirects: 5,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
                .to_string(),
            accept: "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"
                .to_string(),
            accept_language: "en-US,en;q=0.5".to_string(),
        }
    }
}

/// Content rewriting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RewriteConfig {
    /// Inject the client-side runtime patch into rewritten HTML.
    pub inject_runtime: bool,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            inject_runtime: true,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
