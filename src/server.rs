use crate::config::Config;
use crate::error::{Result, WeatherError};
use crate::handlers::{handle, AppState, SharedState};
use crate::middleware::{cors_middleware, logging_middleware};
use crate::rate_limiter::{RateLimiter, SystemClock};
use crate::redis::RedisStore;
use crate::response::ErrorBody;
use crate::store::{KeyValueStore, MemoryStore};
use crate::weather::HttpWeatherApi;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, HeaderValue, Response, StatusCode};
use axum::{middleware, Router};
use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

/// Build the router. Every method and path lands in [`handle`], which owns
/// preflight, routing and error shaping.
pub fn create_app(state: SharedState) -> Router {
    Router::new()
        .fallback(handle)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn_with_state(state.clone(), cors_middleware))
                .layer(CatchPanicLayer::custom(panic_response))
                .layer(middleware::from_fn_with_state(state.clone(), logging_middleware)),
        )
        .with_state(state)
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response<String> {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "handler panicked".to_string()
    };
    tracing::error!(panic = %detail, "Request handler panicked");

    let body = serde_json::to_string(&ErrorBody::new("Internal Server Error", Some(detail)))
        .unwrap_or_else(|_| r#"{"error":"Internal Server Error"}"#.to_string());

    let mut response = Response::new(body);
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

pub struct Server {
    app: Router,
    bind_addr: SocketAddr,
    memory_store: Option<Arc<MemoryStore>>,
    cleanup_interval: Duration,
}

impl Server {
    pub async fn new(config: Config) -> Result<Self> {
        let mut memory_store = None;
        let store: Arc<dyn KeyValueStore> = if config.uses_redis() {
            tracing::info!("Using Redis store at {}", config.redis_url);
            Arc::new(RedisStore::connect(&config.redis_url).await?)
        } else {
            tracing::info!("REDIS_URL not set, counters are kept in process memory");
            let store = Arc::new(MemoryStore::new());
            memory_store = Some(store.clone());
            store
        };

        let client_ip_header = HeaderName::from_bytes(config.client_ip_header.as_bytes())
            .map_err(|e| WeatherError::InvalidConfig(e.to_string()))?;

        let state = Arc::new(AppState {
            rate_limiter: RateLimiter::new(store, config.rate_limit_policy()),
            weather: Arc::new(HttpWeatherApi::new(
                &config.weather_api_url,
                config.upstream_timeout(),
            )?),
            api_key: config.api_key_binding(),
            cors: config.cors_policy(),
            clock: Arc::new(SystemClock),
            client_ip_header,
            default_city: config.default_city.clone(),
            expose_error_details: config.expose_error_details,
        });

        Ok(Self {
            app: create_app(state),
            bind_addr: config.bind_addr,
            memory_store,
            cleanup_interval: Duration::from_secs(config.cleanup_interval_secs.max(1)),
        })
    }

    pub async fn run(self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(self.bind_addr)
            .await
            .map_err(|e| WeatherError::Internal(format!("Failed to bind {}: {}", self.bind_addr, e)))?;

        if let Some(store) = self.memory_store {
            tokio::spawn(purge_expired_loop(store, self.cleanup_interval));
        }

        tracing::info!("Weather edge listening on {}", self.bind_addr);

        // Run server with graceful shutdown
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| WeatherError::Internal(format!("Server error: {}", e)))?;

        Ok(())
    }
}

async fn purge_expired_loop(store: Arc<MemoryStore>, every: Duration) {
    let mut interval = tokio::time::interval(every);
    loop {
        interval.tick().await;
        let removed = store.purge_expired().await;
        if removed > 0 {
            tracing::debug!(removed, "Purged expired rate limit windows");
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        },
    }
}
