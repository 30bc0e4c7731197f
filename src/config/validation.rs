//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, redirect cap)
//! - Check that the endpoint can be embedded in a proxied reference
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ProxyConfig;

/// Upper bound accepted for `upstream.max_redirects`.
pub const MAX_REDIRECT_LIMIT: usize = 20;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: '{value}' is not a valid socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("endpoint.path must start with '/' and must not contain '?' (got '{0}')")]
    InvalidPath(String),

    #[error("endpoint.query_param must be non-empty and URL-safe (got '{0}')")]
    InvalidQueryParam(String),

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("upstream.max_redirects must be at most 20 (got {0})")]
    TooManyRedirects(usize),
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    let path = &config.endpoint.path;
    if !path.starts_with('/') || path.contains('?') || path.contains('#') {
        errors.push(ValidationError::InvalidPath(path.clone()));
    }

    let param = &config.endpoint.query_param;
    let param_is_safe = param
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~'));
    if param.is_empty() || !param_is_safe {
        errors.push(ValidationError::InvalidQueryParam(param.clone()));
    }

    if config.upstream.timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("upstream.timeout_secs"));
    }
    if config.upstream.connect_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("upstream.connect_timeout_secs"));
    }
    if config.upstream.max_redirects > MAX_REDIRECT_LIMIT {
        errors.push(ValidationError::TooManyRedirects(config.upstream.max_redirects));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
