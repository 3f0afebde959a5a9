//! Rate limit bucket keys and client identification.

use axum::http::{HeaderMap, HeaderName};
use std::fmt;

/// Client identity used when the trusted proxy header is missing.
pub const UNKNOWN_CLIENT: &str = "unknown";

const KEY_PREFIX: &str = "rate_limit";

/// One counting bucket: a client IP within one fixed window.
///
/// Renders as `rate_limit:<client_ip>:<window_index>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RateLimitKey {
    pub client_ip: String,
    pub window_index: u64,
}

impl RateLimitKey {
    pub fn new(client_ip: impl Into<String>, window_index: u64) -> Self {
        Self {
            client_ip: client_ip.into(),
            window_index,
        }
    }
}

impl fmt::Display for RateLimitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", KEY_PREFIX, self.client_ip, self.window_index)
    }
}

/// Read the client IP from the trusted proxy header.
///
/// Comma-separated values (`X-Forwarded-For` style) yield the first entry.
/// Missing, empty or non-ASCII values fall back to [`UNKNOWN_CLIENT`].
pub fn extract_client_ip(headers: &HeaderMap, trusted_header: &HeaderName) -> String {
    headers
        .get(trusted_header)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .unwrap_or(UNKNOWN_CLIENT)
        .to_string()
}
