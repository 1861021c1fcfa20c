//! Request context library: one read-only view over an inbound HTTP request.

pub mod config;
pub mod decode;
pub mod error;
pub mod http;
pub mod observability;

pub use config::ContextConfig;
pub use decode::{DecodeError, ValueDecoder, Values};
pub use error::{Error, Result};
pub use http::{attach_binding, Bindings, RequestContext, RouteParams};
