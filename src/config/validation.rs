//! Configuration validation.
//!
//! Serde handles syntax; this module checks values. Validation is a pure
//! function that reports every problem, not just the first.

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::ConsoleConfig;
use crate::ledger::Endpoint;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("node.base_url '{0}' is not an http(s) URL")]
    InvalidNodeUrl(String),

    #[error("{field} '{value}' is not a socket address")]
    InvalidSocketAddress { field: &'static str, value: String },

    #[error("observability.log_level '{0}' must be one of trace, debug, info, warn, error")]
    InvalidLogLevel(String),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ConsoleConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if Endpoint::parse(&config.node.base_url).is_err() {
        errors.push(ValidationError::InvalidNodeUrl(config.node.base_url.clone()));
    }

    if config.console.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidSocketAddress {
            field: "console.bind_address",
            value: config.console.bind_address.clone(),
        });
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidSocketAddress {
            field: "observability.metrics_address",
            value: observability.metrics_address.clone(),
        });
    }

    if !LOG_LEVELS.contains(&observability.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ValidationError::InvalidLogLevel(observability.log_level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
