//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files and
//! default every field, so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};

/// Root configuration for request contexts.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ContextConfig {
    /// Headers consulted when resolving the client IP.
    pub client_ip: ClientIpConfig,

    /// Body capture settings.
    pub body: BodyConfig,

    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Client IP resolution configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ClientIpConfig {
    /// Header holding the client address set by a trusted proxy.
    pub real_ip_header: String,

    /// Header holding the comma-separated forwarding chain.
    pub forwarded_for_header: String,
}

impl Default for ClientIpConfig {
    fn default() -> Self {
        Self {
            real_ip_header: "X-Real-IP".to_string(),
            forwarded_for_header: "X-Forwarded-For".to_string(),
        }
    }
}

/// Body capture configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct BodyConfig {
    /// Maximum captured body size in bytes. Unbounded when unset.
    pub limit_bytes: Option<usize>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Full,
    Compact,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives; `RUST_LOG` takes precedence.
    pub filter: String,

    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "request_context=debug,tower_http=debug".to_string(),
            format: LogFormat::Full,
        }
    }
}
