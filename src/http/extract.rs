//! Axum extractor for [`RequestContext`].
//!
//! Consumes the body, so it must be the last handler argument.

use std::sync::Arc;

use axum::extract::rejection::RawPathParamsRejection;
use axum::extract::{FromRequest, FromRequestParts, RawPathParams};
use axum::http::Request;
use axum::response::{IntoResponse, Response};

use crate::config::ContextConfig;
use crate::http::bindings::Bindings;
use crate::http::context::RequestContext;
use crate::http::params::RouteParams;

impl<S> FromRequest<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: axum::extract::Request, state: &S) -> Result<Self, Self::Rejection> {
        let (mut parts, body) = req.into_parts();

        // Requests that matched no parameterised route carry no params.
        let params = match RawPathParams::from_request_parts(&mut parts, state).await {
            Ok(raw) => raw.iter().collect::<RouteParams>(),
            Err(RawPathParamsRejection::MissingPathParams(_)) => RouteParams::default(),
            Err(rejection) => return Err(rejection.into_response()),
        };
        let bindings = parts.extensions.remove::<Bindings>().unwrap_or_default();
        let config = parts.extensions.get::<Arc<ContextConfig>>().cloned();

        let mut ctx = RequestContext::new(Request::from_parts(parts, body))
            .with_params(params)
            .with_bindings(bindings);
        if let Some(config) = config {
            ctx = ctx.with_config(&config);
        }
        Ok(ctx)
    }
}
