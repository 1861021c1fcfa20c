//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Header names must be valid HTTP field names
//! - Body limit, when set, must be non-zero
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ContextConfig → Result<(), Vec<ValidationError>>

use axum::http::HeaderName;
use thiserror::Error;

use crate::config::schema::ContextConfig;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field}: invalid header name {value:?}")]
    InvalidHeaderName { field: &'static str, value: String },

    #[error("body.limit_bytes must be greater than zero")]
    ZeroBodyLimit,
}

pub fn validate_config(config: &ContextConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let headers = [
        ("client_ip.real_ip_header", &config.client_ip.real_ip_header),
        ("client_ip.forwarded_for_header", &config.client_ip.forwarded_for_header),
    ];
    for (field, value) in headers {
        if HeaderName::from_bytes(value.as_bytes()).is_err() {
            errors.push(ValidationError::InvalidHeaderName {
                field,
                value: value.clone(),
            });
        }
    }

    if config.body.limit_bytes == Some(0) {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
