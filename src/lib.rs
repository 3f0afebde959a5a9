pub mod config;
pub mod config_validator;
pub mod cors;
pub mod credentials;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod rate_limit_config;
pub mod rate_limit_key;
pub mod rate_limiter;
pub mod redis;
pub mod response;
pub mod server;
pub mod store;
pub mod weather;

pub use config::Config;
pub use error::{Result, WeatherError};
pub use rate_limiter::{RateDecision, RateLimiter};
pub use server::{create_app, Server};
pub use store::{KeyValueStore, MemoryStore};
