//! Per-request view over headers, cookies, query, form, route params and body.
//!
//! # Responsibilities
//! - Own the transport request and the router's params for one call
//! - Expose header, cookie, query, form and param accessors
//! - Decode query, form and params into typed targets
//! - Read the body once and keep it replayable
//! - Client IP and content-negotiation heuristics
//!
//! # Design Decisions
//! - Absent headers, cookies and params read as empty strings
//! - Form values are parsed at most once; the outcome is cached
//! - Body-backed operations are async because the transport body is

use std::net::SocketAddr;

use axum::body::{Body, Bytes};
use axum::extract::ConnectInfo;
use axum::http::{header, HeaderMap, Request};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ContextConfig;
use crate::decode::{ValueDecoder, Values};
use crate::error::{Error, Result};
use crate::http::bindings::Bindings;
use crate::http::body::{BodyCache, BodyState};
use crate::http::client_ip::ClientIpResolver;
use crate::http::cookies::find_cookie;
use crate::http::form::{has_form_body, parse_form, FormError};
use crate::http::negotiation::Accept;
use crate::http::params::RouteParams;

pub const X_REQUESTED_WITH: &str = "x-requested-with";
pub const XML_HTTP_REQUEST: &str = "XMLHttpRequest";

/// Façade over one inbound request.
///
/// Created after route matching and dropped when the call completes. Not
/// shared across calls.
#[derive(Debug)]
pub struct RequestContext {
    request: Request<Body>,
    params: RouteParams,
    remote_addr: String,
    bindings: Bindings,
    body: BodyCache,
    form: Option<std::result::Result<Values, FormError>>,
    resolver: ClientIpResolver,
    decoder: ValueDecoder,
}

impl RequestContext {
    /// Wrap a transport request. The remote address is taken from
    /// `ConnectInfo<SocketAddr>` when the server recorded it.
    pub fn new(request: Request<Body>) -> Self {
        let remote_addr = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.to_string())
            .unwrap_or_default();
        Self {
            request,
            params: RouteParams::default(),
            remote_addr,
            bindings: Bindings::default(),
            body: BodyCache::default(),
            form: None,
            resolver: ClientIpResolver::default(),
            decoder: ValueDecoder::new(),
        }
    }

    pub fn with_params(mut self, params: RouteParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_remote_addr(mut self, remote_addr: impl Into<String>) -> Self {
        self.remote_addr = remote_addr.into();
        self
    }

    pub fn with_bindings(mut self, bindings: Bindings) -> Self {
        self.bindings = bindings;
        self
    }

    /// Apply client-IP and body settings. Must precede the first body read.
    pub fn with_config(mut self, config: &ContextConfig) -> Self {
        self.resolver = ClientIpResolver::from_config(&config.client_ip);
        if matches!(self.body.state(), BodyState::Unread) {
            self.body = BodyCache::new(config.body.limit_bytes);
        }
        self
    }

    pub fn base_request(&self) -> &Request<Body> {
        &self.request
    }

    pub fn base_request_mut(&mut self) -> &mut Request<Body> {
        &mut self.request
    }

    /// Hand the transport request back, with a replayable body if it was
    /// read.
    pub fn into_request(self) -> Request<Body> {
        self.request
    }

    pub fn headers(&self) -> &HeaderMap {
        self.request.headers()
    }

    /// Trimmed header value; empty when absent or not valid UTF-8.
    pub fn header(&self, name: &str) -> &str {
        self.request
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .unwrap_or_default()
    }

    pub fn header_contains(&self, name: &str, substring: &str) -> bool {
        self.header(name).contains(substring)
    }

    pub fn is_ajax(&self) -> bool {
        self.header(X_REQUESTED_WITH) == XML_HTTP_REQUEST
    }

    pub fn method(&self) -> &str {
        self.request.method().as_str()
    }

    /// Request target as received (path and query).
    pub fn url(&self) -> String {
        self.request.uri().to_string()
    }

    pub fn referer(&self) -> &str {
        self.header(header::REFERER.as_str())
    }

    pub fn remote_addr(&self) -> &str {
        &self.remote_addr
    }

    pub fn client_ip(&self) -> String {
        self.resolver.resolve(self.request.headers(), &self.remote_addr)
    }

    fn accept(&self) -> Accept<'_> {
        Accept::new(self.header(header::ACCEPT.as_str()))
    }

    pub fn wants_json(&self) -> bool {
        self.accept().wants_json()
    }

    pub fn wants_html(&self) -> bool {
        self.accept().wants_html()
    }

    pub fn wants_plain_text(&self) -> bool {
        self.accept().wants_plain_text()
    }

    /// Legacy cookie accessor.
    ///
    /// Its presence check is inverted: a found cookie yields an empty string
    /// and a missing cookie serialises nothing, so the result is always
    /// empty. Kept so existing call sites do not silently change behavior.
    #[deprecated(note = "presence check is inverted; use `cookie_value` or `has_cookie`")]
    pub fn cookie(&self, _name: &str) -> String {
        String::new()
    }

    /// Value of cookie `name`, empty when absent.
    pub fn cookie_value(&self, name: &str) -> &str {
        find_cookie(self.request.headers(), name).unwrap_or_default()
    }

    /// `name=value` form of cookie `name`, empty when absent.
    pub fn cookie_string(&self, name: &str) -> String {
        find_cookie(self.request.headers(), name)
            .map(|value| format!("{name}={value}"))
            .unwrap_or_default()
    }

    pub fn has_cookie(&self, name: &str) -> bool {
        find_cookie(self.request.headers(), name).is_some()
    }

    /// Route param `name`, empty when the route has none.
    pub fn route_param(&self, name: &str) -> &str {
        self.params.by_name(name)
    }

    pub fn route_params(&self) -> &RouteParams {
        &self.params
    }

    pub fn route_param_values(&self) -> Values {
        self.params.to_values()
    }

    /// Parsed URL query string. Pairs with malformed escapes are dropped.
    pub fn query(&self) -> Values {
        self.request
            .uri()
            .query()
            .map(|q| Values::parse_lenient(q.as_bytes()))
            .unwrap_or_default()
    }

    /// Submitted form values, parsed on first call.
    ///
    /// Urlencoded body pairs of POST, PUT and PATCH requests come first,
    /// followed by query pairs.
    pub async fn try_form_values(&mut self) -> std::result::Result<&Values, FormError> {
        let outcome = match self.form.take() {
            Some(outcome) => outcome,
            None => self.parse_form().await,
        };
        match self.form.insert(outcome) {
            Ok(values) => Ok(&*values),
            Err(e) => Err(e.clone()),
        }
    }

    /// Like [`try_form_values`](Self::try_form_values), but a parse failure
    /// reads as an empty mapping.
    pub async fn form_values(&mut self) -> Values {
        match self.try_form_values().await {
            Ok(values) => values.clone(),
            Err(e) => {
                tracing::debug!(error = %e, "Form parse failed; returning empty values");
                Values::new()
            }
        }
    }

    async fn parse_form(&mut self) -> std::result::Result<Values, FormError> {
        let mut values = Values::new();
        if has_form_body(self.request.method(), self.request.headers()) {
            match self.body.read_raw(&mut self.request).await {
                Ok(bytes) => values = parse_form(&bytes, "body")?,
                Err(Error::BodyRead(e)) => return Err(FormError::Body(e)),
                // Absent body: query pairs only.
                Err(_) => {}
            }
        }
        if let Some(query) = self.request.uri().query() {
            values.extend(parse_form(query.as_bytes(), "query")?);
        }
        Ok(values)
    }

    /// Decode submitted form values into `target`.
    pub async fn read_form<T>(&mut self, target: &mut T) -> Result<()>
    where
        T: Serialize + DeserializeOwned,
    {
        let decoder = self.decoder;
        let values = self.try_form_values().await?;
        decoder.decode_into(target, values)?;
        Ok(())
    }

    /// Decode the query string into `target`.
    pub fn read_query<T>(&self, target: &mut T) -> Result<()>
    where
        T: Serialize + DeserializeOwned,
    {
        self.decoder.decode_into(target, &self.query())?;
        Ok(())
    }

    /// Decode route params into `target`.
    pub fn read_params<T>(&self, target: &mut T) -> Result<()>
    where
        T: Serialize + DeserializeOwned,
    {
        self.decoder.decode_into(target, &self.route_param_values())?;
        Ok(())
    }

    /// Whole request payload. The stream is drained once; the request keeps
    /// a replay of the bytes.
    pub async fn read_raw(&mut self) -> Result<Bytes> {
        self.body.read_raw(&mut self.request).await
    }

    /// Decode the JSON body into `target`.
    pub async fn read_json<T: DeserializeOwned>(&mut self, target: &mut T) -> Result<()> {
        let raw = self.read_raw().await?;
        *target = serde_json::from_slice(&raw)?;
        Ok(())
    }

    /// Attach an opaque value for later retrieval within this request.
    pub fn bind<T: std::any::Any + Send + Sync>(&mut self, value: T) {
        self.bindings.push(value);
    }

    /// First binding of type `T`.
    pub fn binding<T: std::any::Any + Send + Sync>(&self) -> Option<&T> {
        self.bindings.get::<T>()
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }
}
