//! Error types for request access and decoding.
//!
//! Absence of a header, cookie or route param is not an error: those
//! accessors return an empty value. Only body reads, structured decoding and
//! strict form parsing surface failures.

use std::sync::Arc;

use thiserror::Error;

use crate::decode::DecodeError;
use crate::http::form::FormError;

/// Errors raised by [`RequestContext`](crate::RequestContext) operations.
#[derive(Debug, Error)]
pub enum Error {
    /// No body was attached to the request.
    #[error("request body is absent")]
    BodyAbsent,

    /// The transport stream could not be fully drained.
    #[error("failed to read request body: {0}")]
    BodyRead(#[source] Arc<axum::Error>),

    /// The body is not well-formed JSON or does not match the target shape.
    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),

    /// Form parsing failed.
    #[error(transparent)]
    Form(#[from] FormError),

    /// A value could not be decoded into the target.
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

pub type Result<T> = std::result::Result<T, Error>;
