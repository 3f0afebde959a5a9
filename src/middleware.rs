use axum::{
    extract::{Request, State},
    http::header::ORIGIN,
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::info;

use crate::handlers::SharedState;
use crate::rate_limit_key::extract_client_ip;

/// Logging middleware for request/response tracking
pub async fn logging_middleware(
    State(state): State<SharedState>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let client_ip = extract_client_ip(request.headers(), &state.client_ip_header);
    let started = Instant::now();

    info!(
        target: "weather_edge::middleware",
        method = %method,
        uri = %uri,
        client_ip = %client_ip,
        "Incoming request"
    );

    let response = next.run(request).await;

    info!(
        target: "weather_edge::middleware",
        method = %method,
        uri = %uri,
        status = %response.status(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Request completed"
    );

    response
}

/// Attach CORS headers to every response, including 500s produced by the
/// panic handler, so it must sit outside `CatchPanicLayer`.
pub async fn cors_middleware(
    State(state): State<SharedState>,
    request: Request,
    next: Next,
) -> Response {
    let origin = request.headers().get(ORIGIN).cloned();
    let mut response = next.run(request).await;
    state.cors.apply(response.headers_mut(), origin.as_ref());
    response
}
