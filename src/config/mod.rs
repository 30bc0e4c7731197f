//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) or nothing
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → endpoint/upstream/rewrite sections handed to their subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the proxy keeps no other state
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    EndpointConfig, ListenerConfig, LogFormat, ObservabilityConfig, ProxyConfig, RewriteConfig,
    UpstreamConfig,
};
