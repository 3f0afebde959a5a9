use axum::{
    extract::{Query, State},
    http::{HeaderMap, HeaderName, Method, Uri},
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::cors::CorsPolicy;
use crate::credentials::ApiKeyBinding;
use crate::error::{Result, WeatherError};
use crate::rate_limit_key::extract_client_ip;
use crate::rate_limiter::{Clock, RateLimiter};
use crate::response::{preflight_response, weather_response};
use crate::weather::WeatherApi;

pub const DEFAULT_CITY: &str = "Beijing";

/// Shared application state
pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub rate_limiter: RateLimiter,
    pub weather: Arc<dyn WeatherApi>,
    pub api_key: ApiKeyBinding,
    pub cors: CorsPolicy,
    pub clock: Arc<dyn Clock>,
    pub client_ip_header: HeaderName,
    pub default_city: String,
    pub expose_error_details: bool,
}

/// The city a request asks about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherQuery {
    pub city: String,
    pub defaulted: bool,
}

impl WeatherQuery {
    /// The first `city` parameter wins. An absent or empty one falls back to
    /// `default_city`.
    pub fn from_uri(uri: &Uri, default_city: &str) -> Self {
        let city = Query::<Vec<(String, String)>>::try_from_uri(uri)
            .ok()
            .and_then(|Query(pairs)| {
                pairs
                    .into_iter()
                    .find(|(name, _)| name == "city")
                    .map(|(_, value)| value)
            });

        match city.filter(|c| !c.is_empty()) {
            Some(city) => Self {
                city,
                defaulted: false,
            },
            None => Self {
                city: default_city.to_string(),
                defaulted: true,
            },
        }
    }
}

/// Single entry point for every method and path.
///
/// Preflights short-circuit with 204. Everything else runs through
/// [`serve_weather`], and any error it returns becomes a JSON response here.
/// CORS headers are added by [`cors_middleware`](crate::middleware::cors_middleware).
pub async fn handle(
    State(state): State<SharedState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    if method == Method::OPTIONS {
        return preflight_response();
    }

    match serve_weather(&state, &uri, &headers).await {
        Ok(response) => response,
        Err(err) => {
            log_failure(&err);
            err.to_response(state.expose_error_details)
        }
    }
}

async fn serve_weather(state: &AppState, uri: &Uri, headers: &HeaderMap) -> Result<Response> {
    if uri.path() != "/" {
        return Err(WeatherError::NotFound(uri.path().to_string()));
    }

    let api_key = state.api_key.resolve().await?;

    let client_ip = extract_client_ip(headers, &state.client_ip_header);
    let policy = *state.rate_limiter.policy();
    let decision = state
        .rate_limiter
        .evaluate(&client_ip, state.clock.now())
        .await?;

    if !decision.allowed {
        return Err(WeatherError::QuotaExceeded {
            limit: policy.limit,
            retry_after: policy.window_secs(),
        });
    }

    let query = WeatherQuery::from_uri(uri, &state.default_city);
    debug!(
        client_ip = %client_ip,
        city = %query.city,
        defaulted = query.defaulted,
        remaining = decision.remaining,
        "Forwarding weather query"
    );

    let body = state.weather.fetch_current(&query.city, &api_key).await?;

    info!(client_ip = %client_ip, city = %query.city, "Weather request served");
    Ok(weather_response(body, policy.limit, decision.remaining))
}

fn log_failure(err: &WeatherError) {
    match err {
        WeatherError::NotFound(path) => debug!(path = %path, "Unknown path"),
        WeatherError::QuotaExceeded { limit, .. } => warn!(limit, "Rate limit exceeded"),
        WeatherError::Upstream { status } => warn!(status, "Upstream weather API failed"),
        other => error!(error = %other, "Request failed"),
    }
}
