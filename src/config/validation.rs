//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (dimensions > 0, quality in 1..=100)
//! - Validate addresses parse before anything binds to them
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ServiceConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field}: must be greater than zero")]
    Zero { field: &'static str },

    #[error("filter.jpeg_quality: {0} is outside 1..=100")]
    JpegQuality(u8),
}

/// Check a parsed configuration for semantic errors.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    let filter = &config.filter;
    if filter.width == 0 {
        errors.push(ValidationError::Zero { field: "filter.width" });
    }
    if filter.height == 0 {
        errors.push(ValidationError::Zero { field: "filter.height" });
    }
    if !(1..=100).contains(&filter.jpeg_quality) {
        errors.push(ValidationError::JpegQuality(filter.jpeg_quality));
    }
    if filter.max_source_bytes == 0 {
        errors.push(ValidationError::Zero { field: "filter.max_source_bytes" });
    }

    if config.upstream.timeout_secs == Some(0) {
        errors.push(ValidationError::Zero { field: "upstream.timeout_secs" });
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
