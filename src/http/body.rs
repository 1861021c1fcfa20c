//! Replayable request body.
//!
//! # Responsibilities
//! - Drain the transport body at most once per request
//! - Install the captured bytes back onto the request so later readers of
//!   the request's own body still see the full payload
//! - Serve the same bytes on every subsequent read
//!
//! # Design Decisions
//! - No size limit by default; bounding the payload belongs to the transport
//!   layer (an optional limit can be configured)
//! - A body is absent only when the stream is already at its end and the
//!   request carries no `Content-Length` or `Transfer-Encoding`; a framed
//!   zero-length body reads as empty
//! - A failed read is not retried; later reads re-serve the same failure.
//!   The drained stream cannot be restored, so the request keeps an empty body

use std::sync::Arc;

use axum::body::{Body, Bytes, HttpBody};
use axum::http::{header, Request};

use crate::error::{Error, Result};

/// Captured bytes that can be installed as a fresh transport body.
#[derive(Debug, Clone)]
pub struct ReplayableBody(Bytes);

impl ReplayableBody {
    pub fn new(bytes: Bytes) -> Self {
        Self(bytes)
    }

    pub fn bytes(&self) -> &Bytes {
        &self.0
    }

    /// Replace the body of `request` with a replay of these bytes.
    pub fn install(&self, request: &mut Request<Body>) {
        *request.body_mut() = Body::from(self.0.clone());
    }
}

impl From<ReplayableBody> for Body {
    fn from(body: ReplayableBody) -> Self {
        Body::from(body.0)
    }
}

/// State of the body capture.
#[derive(Debug, Clone, Default)]
pub enum BodyState {
    /// No read attempted yet.
    #[default]
    Unread,
    /// Read, and the stream yielded no bytes.
    Empty,
    Captured(ReplayableBody),
    /// The stream could not be drained.
    Failed(Arc<axum::Error>),
}

/// Lazily captures the request payload.
#[derive(Debug, Default)]
pub struct BodyCache {
    state: BodyState,
    limit: Option<usize>,
}

impl BodyCache {
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            state: BodyState::Unread,
            limit,
        }
    }

    pub fn state(&self) -> &BodyState {
        &self.state
    }

    /// Read the whole payload of `request`, draining its stream only on the
    /// first successful call.
    pub async fn read_raw(&mut self, request: &mut Request<Body>) -> Result<Bytes> {
        match &self.state {
            BodyState::Captured(body) => return Ok(body.bytes().clone()),
            BodyState::Empty => return Ok(Bytes::new()),
            BodyState::Failed(e) => return Err(Error::BodyRead(e.clone())),
            BodyState::Unread => {}
        }

        if is_absent(request) {
            return Err(Error::BodyAbsent);
        }

        let body = std::mem::take(request.body_mut());
        let bytes = match axum::body::to_bytes(body, self.limit.unwrap_or(usize::MAX)).await {
            Ok(bytes) => bytes,
            Err(e) => {
                let e = Arc::new(e);
                tracing::debug!(error = %e, "Request body read failed");
                self.state = BodyState::Failed(e.clone());
                return Err(Error::BodyRead(e));
            }
        };

        tracing::debug!(bytes = bytes.len(), "Request body captured");

        let replay = ReplayableBody::new(bytes.clone());
        replay.install(request);
        self.state = if bytes.is_empty() {
            BodyState::Empty
        } else {
            BodyState::Captured(replay)
        };
        Ok(bytes)
    }
}

fn is_absent(request: &Request<Body>) -> bool {
    let headers = request.headers();
    request.body().is_end_stream()
        && !headers.contains_key(header::CONTENT_LENGTH)
        && !headers.contains_key(header::TRANSFER_ENCODING)
}
