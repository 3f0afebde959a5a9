use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::response::{
    ErrorBody, QuotaExceededBody, UpstreamErrorBody, X_RATELIMIT_LIMIT, X_RATELIMIT_REMAINING,
};

pub type Result<T, E = WeatherError> = std::result::Result<T, E>;

const REDACTED_MESSAGE: &str = "An internal error occurred";

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("weather API key binding is not configured")]
    CredentialMissing,

    #[error("unsupported API key source '{0}'")]
    CredentialUnsupported(String),

    #[error("failed to retrieve API key: {0}")]
    CredentialRetrieval(String),

    #[error("weather API key resolved to an empty string")]
    CredentialEmpty,

    #[error("rate limit of {limit} requests exceeded, retry after {retry_after}s")]
    QuotaExceeded { limit: u64, retry_after: u64 },

    #[error("weather API responded with status {status}")]
    Upstream { status: u16 },

    #[error("path {0} does not exist")]
    NotFound(String),

    #[error("key-value store error: {0}")]
    Store(String),

    #[error("weather API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<redis::RedisError> for WeatherError {
    fn from(err: redis::RedisError) -> Self {
        WeatherError::Store(err.to_string())
    }
}

impl WeatherError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            WeatherError::QuotaExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            WeatherError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            WeatherError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Builds the JSON error response. With `expose_details` off, the
    /// `message` of 500 bodies is replaced by a generic string.
    pub fn to_response(&self, expose_details: bool) -> Response {
        let status = self.status_code();
        let message = |detail: String| {
            if expose_details {
                Some(detail)
            } else {
                Some(REDACTED_MESSAGE.to_string())
            }
        };

        match self {
            WeatherError::QuotaExceeded { limit, retry_after } => {
                let mut response = (
                    status,
                    Json(QuotaExceededBody {
                        error: "Rate limit exceeded".to_string(),
                        retry_after: *retry_after,
                    }),
                )
                    .into_response();
                let headers = response.headers_mut();
                headers.insert(axum::http::header::RETRY_AFTER, HeaderValue::from(*retry_after));
                headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(*limit));
                headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(0u64));
                response
            }
            WeatherError::Upstream { status: upstream } => (
                status,
                Json(UpstreamErrorBody {
                    error: "Weather API request failed".to_string(),
                    status: *upstream,
                }),
            )
                .into_response(),
            WeatherError::NotFound(path) => (
                status,
                Json(ErrorBody::new(
                    "Not Found",
                    Some(format!("No route for {path}, use GET /?city=<name>")),
                )),
            )
                .into_response(),
            WeatherError::CredentialMissing => (
                status,
                Json(ErrorBody::new("API key not configured", message(self.to_string()))),
            )
                .into_response(),
            WeatherError::CredentialUnsupported(_) => (
                status,
                Json(ErrorBody::new(
                    "Invalid API key configuration",
                    message(self.to_string()),
                )),
            )
                .into_response(),
            WeatherError::CredentialRetrieval(_) => (
                status,
                Json(ErrorBody::new("Failed to retrieve API key", message(self.to_string()))),
            )
                .into_response(),
            WeatherError::CredentialEmpty => (
                status,
                Json(ErrorBody::new("API key is empty", message(self.to_string()))),
            )
                .into_response(),
            _ => (
                status,
                Json(ErrorBody::new("Internal Server Error", message(self.to_string()))),
            )
                .into_response(),
        }
    }
}

impl IntoResponse for WeatherError {
    fn into_response(self) -> Response {
        self.to_response(true)
    }
}
