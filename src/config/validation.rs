//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate node URLs and value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BridgeConfig → Result<(), Vec<ValidationError>>

use thiserror::Error;

use crate::config::schema::BridgeConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid URL '{value}'")]
    InvalidUrl { field: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("{field}: {message}")]
    OutOfRange { field: &'static str, message: String },
}

fn check_url(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    match url::Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        _ => errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
        }),
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &BridgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_url("node.url", &config.node.url, &mut errors);
    for url in &config.node.failover_urls {
        check_url("node.failover_urls", url, &mut errors);
    }

    if config.node.request_timeout_secs == 0 {
        errors.push(ValidationError::Zero("node.request_timeout_secs"));
    }
    if config.node.max_read_attempts == 0 {
        errors.push(ValidationError::Zero("node.max_read_attempts"));
    }
    if config.node.retry_base_delay_ms > config.node.retry_max_delay_ms {
        errors.push(ValidationError::OutOfRange {
            field: "node.retry_base_delay_ms",
            message: "exceeds node.retry_max_delay_ms".to_string(),
        });
    }

    if config.confirmation.wait_rounds == 0 {
        errors.push(ValidationError::Zero("confirmation.wait_rounds"));
    }
    if config.confirmation.deadline_secs == Some(0) {
        errors.push(ValidationError::Zero("confirmation.deadline_secs"));
    }

    check_url("inkey.frame_url", &config.inkey.frame_url, &mut errors);

    if config.local_wallet.enabled && config.local_wallet.key_env_var.trim().is_empty() {
        errors.push(ValidationError::OutOfRange {
            field: "local_wallet.key_env_var",
            message: "must name an environment variable when the local wallet is enabled"
                .to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
