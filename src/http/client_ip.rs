//! Best-effort client IP resolution.
//!
//! # Resolution Order (first non-empty wins)
//! 1. `X-Real-IP`, trimmed
//! 2. Left-most entry of `X-Forwarded-For`, trimmed
//! 3. Host part of the transport remote address (`host:port`), or the raw
//!    address when it has no port
//! 4. Empty string
//!
//! # Design Decisions
//! - No validation that the result is a well-formed IP
//! - Header names are configurable; the order is not

use axum::http::HeaderMap;

use crate::config::ClientIpConfig;

/// Resolves the originating client address of a request.
#[derive(Debug, Clone)]
pub struct ClientIpResolver {
    real_ip_header: String,
    forwarded_for_header: String,
}

impl Default for ClientIpResolver {
    fn default() -> Self {
        Self::from_config(&ClientIpConfig::default())
    }
}

impl ClientIpResolver {
    pub fn from_config(config: &ClientIpConfig) -> Self {
        Self {
            real_ip_header: config.real_ip_header.clone(),
            forwarded_for_header: config.forwarded_for_header.clone(),
        }
    }

    pub fn resolve(&self, headers: &HeaderMap, remote_addr: &str) -> String {
        let real_ip = header_str(headers, &self.real_ip_header);
        if !real_ip.is_empty() {
            tracing::trace!(ip = %real_ip, source = %self.real_ip_header, "Client IP resolved");
            return real_ip.to_string();
        }

        let forwarded = header_str(headers, &self.forwarded_for_header);
        let first = forwarded.split(',').next().unwrap_or_default().trim();
        if !first.is_empty() {
            tracing::trace!(ip = %first, source = %self.forwarded_for_header, "Client IP resolved");
            return first.to_string();
        }

        let addr = remote_addr.trim();
        if addr.is_empty() {
            return String::new();
        }
        let ip = split_host(addr).unwrap_or(addr);
        tracing::trace!(ip = %ip, source = "remote_addr", "Client IP resolved");
        ip.to_string()
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .unwrap_or_default()
}

/// Host part of `host:port` or `[host]:port`; `None` when `addr` is not in
/// that form.
fn split_host(addr: &str) -> Option<&str> {
    if let Some(rest) = addr.strip_prefix('[') {
        let (host, tail) = rest.split_once(']')?;
        return tail.strip_prefix(':').map(|_| host);
    }
    let (host, _port) = addr.rsplit_once(':')?;
    if host.contains(':') {
        return None;
    }
    Some(host)
}
