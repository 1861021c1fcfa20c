//! HTTP request access subsystem.
//!
//! # Data Flow
//! ```text
//! axum Request (after route matching)
//!     → extract.rs (route params, bindings, config from extensions)
//!     → context.rs (RequestContext façade)
//!         → body.rs (capture once, replay)
//!         → form.rs / cookies.rs / params.rs (value sources)
//!         → client_ip.rs / negotiation.rs (heuristics)
//!         → decode (typed targets)
//! ```

pub mod bindings;
pub mod body;
pub mod client_ip;
pub mod context;
pub mod cookies;
mod extract;
pub mod form;
pub mod negotiation;
pub mod params;

pub use bindings::{attach_binding, Bindings};
pub use body::{BodyCache, BodyState, ReplayableBody};
pub use client_ip::ClientIpResolver;
pub use context::RequestContext;
pub use form::FormError;
pub use negotiation::Accept;
pub use params::RouteParams;
