//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Select output format from config
//!
//! # Design Decisions
//! - `RUST_LOG` overrides the configured filter
//! - Library code only emits events; installing a subscriber is left to the
//!   binary

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};

/// Build the filter: `RUST_LOG` when set, else the configured directives.
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter))
}

/// Install the global subscriber. Fails if one is already set.
pub fn init_logging(config: &LoggingConfig) -> Result<(), tracing_subscriber::util::TryInitError> {
    let (full, compact) = match config.format {
        LogFormat::Full => (Some(fmt::layer()), None),
        LogFormat::Compact => (None, Some(fmt::layer().compact())),
    };

    tracing_subscriber::registry()
        .with(env_filter(config))
        .with(full)
        .with(compact)
        .try_init()
}
