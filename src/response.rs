use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");

/// Generic error body, `{error, message?}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn new(error: &str, message: Option<String>) -> Self {
        Self {
            error: error.to_string(),
            message,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct QuotaExceededBody {
    pub error: String,
    #[serde(rename = "retryAfter")]
    pub retry_after: u64,
}

#[derive(Debug, Serialize)]
pub struct UpstreamErrorBody {
    pub error: String,
    pub status: u16,
}

/// Successful weather reply: the upstream JSON passed through untouched.
pub fn weather_response(body: serde_json::Value, limit: u64, remaining: u64) -> Response {
    let mut response = (StatusCode::OK, Json(body)).into_response();
    let headers = response.headers_mut();
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(remaining));
    response
}

/// Empty 204 reply to a CORS preflight. CORS headers are added by the caller.
pub fn preflight_response() -> Response {
    StatusCode::NO_CONTENT.into_response()
}
