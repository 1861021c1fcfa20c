//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! RequestContext operations
//!     → tracing events (body capture, form failures, client IP source)
//!     → logging.rs subscriber (stdout)
//! ```

pub mod logging;

pub use logging::init_logging;
