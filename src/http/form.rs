//! Strict `application/x-www-form-urlencoded` parsing.

use std::sync::Arc;

use axum::http::{header, HeaderMap, Method};
use thiserror::Error;

use crate::decode::values::first_invalid_escape;
use crate::decode::Values;

pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Form parsing failure. Cached with the parse outcome, hence `Clone`.
#[derive(Debug, Clone, Error)]
pub enum FormError {
    #[error("invalid percent-escape at byte {offset} of {source_name}")]
    InvalidEscape {
        source_name: &'static str,
        offset: usize,
    },

    #[error("failed to read form body: {0}")]
    Body(#[source] Arc<axum::Error>),
}

/// Parse `input`, rejecting `%` not followed by two hex digits.
pub fn parse_form(input: &[u8], source_name: &'static str) -> Result<Values, FormError> {
    if let Some(offset) = first_invalid_escape(input) {
        return Err(FormError::InvalidEscape {
            source_name,
            offset,
        });
    }
    Ok(Values::parse_lenient(input))
}

/// Whether a request with this method and these headers carries form pairs
/// in its body.
pub fn has_form_body(method: &Method, headers: &HeaderMap) -> bool {
    if !matches!(*method, Method::POST | Method::PUT | Method::PATCH) {
        return false;
    }
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|media| media.trim().eq_ignore_ascii_case(FORM_URLENCODED))
        .unwrap_or(false)
}
