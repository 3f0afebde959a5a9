use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    ACCESS_CONTROL_MAX_AGE,
};
use axum::http::{HeaderMap, HeaderValue};

/// Local development origins that get their own origin echoed back.
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://localhost:5173,\
http://localhost:5500,http://localhost:8080,http://127.0.0.1:3000,http://127.0.0.1:5173,\
http://127.0.0.1:5500,http://127.0.0.1:8080";

const ALLOWED_METHODS: &str = "GET, POST, OPTIONS";
const ALLOWED_HEADERS: &str = "Content-Type, Authorization";
const MAX_AGE_SECS: u64 = 86400;

/// Origin allow-list. Listed origins are echoed; every other origin,
/// including a missing one, gets `*`.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    allowed_origins: Vec<HeaderValue>,
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self::from_list(DEFAULT_ALLOWED_ORIGINS)
    }
}

impl CorsPolicy {
    pub fn new(allowed_origins: Vec<HeaderValue>) -> Self {
        Self { allowed_origins }
    }

    /// Parse a comma-separated list, skipping entries that are not valid
    /// header values.
    pub fn from_list(origins: &str) -> Self {
        Self::new(
            origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .filter_map(|o| HeaderValue::from_str(o).ok())
                .collect(),
        )
    }

    pub fn allow_origin(&self, origin: Option<&HeaderValue>) -> HeaderValue {
        origin
            .filter(|o| self.allowed_origins.contains(o))
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static("*"))
    }

    pub fn apply(&self, headers: &mut HeaderMap, origin: Option<&HeaderValue>) {
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, self.allow_origin(origin));
        headers.insert(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        );
        headers.insert(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        );
        headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from(MAX_AGE_SECS));
    }
}
