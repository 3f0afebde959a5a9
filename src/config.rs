use clap::{ArgAction, Parser};
use std::net::SocketAddr;
use std::time::Duration;

use crate::config_validator::ConfigValidator;
use crate::cors::{CorsPolicy, DEFAULT_ALLOWED_ORIGINS};
use crate::credentials::ApiKeyBinding;
use crate::error::Result;
use crate::handlers::DEFAULT_CITY;
use crate::rate_limit_config::RateLimitPolicy;
use crate::weather::DEFAULT_WEATHER_API_URL;

/// Service configuration. Every option can come from the command line or
/// from the environment (including a `.env` file).
#[derive(Debug, Clone, Parser)]
#[command(name = "weather-edge", version, about = "Rate-limited weather API edge proxy")]
pub struct Config {
    /// Server bind address
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:3000")]
    pub bind_addr: SocketAddr,

    /// Redis connection URL; empty keeps counters in process memory
    #[arg(long, env = "REDIS_URL", default_value = "")]
    pub redis_url: String,

    /// Requests allowed per client per window
    #[arg(long, env = "RATE_LIMIT", default_value_t = 10)]
    pub rate_limit: u64,

    /// Window length in seconds
    #[arg(long, env = "RATE_LIMIT_WINDOW_SECS", default_value_t = 60)]
    pub window_secs: u64,

    /// Upstream current-weather endpoint
    #[arg(long, env = "WEATHER_API_URL", default_value = DEFAULT_WEATHER_API_URL)]
    pub weather_api_url: String,

    /// API key, or a file path / variable name depending on the source
    #[arg(long, env = "WEATHER_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// How to interpret the API key: literal, file or env
    #[arg(long, env = "WEATHER_API_KEY_SOURCE")]
    pub api_key_source: Option<String>,

    #[arg(long, env = "DEFAULT_CITY", default_value = DEFAULT_CITY)]
    pub default_city: String,

    /// Trusted proxy header carrying the client IP
    #[arg(long, env = "CLIENT_IP_HEADER", default_value = "cf-connecting-ip")]
    pub client_ip_header: String,

    /// Comma-separated origins echoed in Access-Control-Allow-Origin
    #[arg(long, env = "CORS_ALLOWED_ORIGINS", default_value = DEFAULT_ALLOWED_ORIGINS)]
    pub cors_allowed_origins: String,

    /// Upstream request timeout in seconds, 0 disables it
    #[arg(long, env = "UPSTREAM_TIMEOUT_SECS", default_value_t = 10)]
    pub upstream_timeout_secs: u64,

    /// Include internal error messages in 500 responses
    #[arg(long, env = "EXPOSE_ERROR_DETAILS", default_value_t = true, action = ArgAction::Set)]
    pub expose_error_details: bool,

    /// Purge interval for the in-memory store, in seconds
    #[arg(long, env = "MEMORY_STORE_CLEANUP_SECS", default_value_t = 300)]
    pub cleanup_interval_secs: u64,

    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables only
    pub fn from_env() -> std::result::Result<Self, clap::Error> {
        Config::try_parse_from(["weather-edge"])
    }

    pub fn validate(&self) -> Result<()> {
        ConfigValidator::validate_config(self)
    }

    pub fn rate_limit_policy(&self) -> RateLimitPolicy {
        RateLimitPolicy::new(self.rate_limit, Duration::from_secs(self.window_secs))
    }

    pub fn api_key_binding(&self) -> ApiKeyBinding {
        ApiKeyBinding::from_config(self.api_key_source.as_deref(), self.api_key.as_deref())
    }

    pub fn cors_policy(&self) -> CorsPolicy {
        CorsPolicy::from_list(&self.cors_allowed_origins)
    }

    pub fn upstream_timeout(&self) -> Option<Duration> {
        (self.upstream_timeout_secs > 0).then(|| Duration::from_secs(self.upstream_timeout_secs))
    }

    pub fn uses_redis(&self) -> bool {
        !self.redis_url.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        let mut argv = vec!["weather-edge"];
        argv.extend_from_slice(args);
        Config::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_explicit_arguments() {
        let config = parse(&[
            "--bind-addr",
            "0.0.0.0:8787",
            "--rate-limit",
            "30",
            "--window-secs",
            "120",
            "--api-key",
            "k",
            "--upstream-timeout-secs",
            "0",
            "--expose-error-details",
            "false",
        ]);

        assert_eq!(config.bind_addr.port(), 8787);
        assert_eq!(
            config.rate_limit_policy(),
            RateLimitPolicy::new(30, Duration::from_secs(120))
        );
        assert_eq!(config.upstream_timeout(), None);
        assert!(!config.expose_error_details);
        assert!(matches!(config.api_key_binding(), ApiKeyBinding::Literal(_)));
    }

    #[test]
    fn test_redis_selection() {
        assert!(!parse(&["--redis-url", ""]).uses_redis());
        assert!(parse(&["--redis-url", "redis://cache:6379"]).uses_redis());
    }

    #[test]
    fn test_key_source_argument() {
        let config = parse(&["--api-key", "/run/secrets/weather", "--api-key-source", "file"]);
        assert!(matches!(config.api_key_binding(), ApiKeyBinding::Provider(_)));
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]);
        assert_eq!(config.default_city, "Beijing");
        assert_eq!(config.client_ip_header, "cf-connecting-ip");
        assert!(Config::from_env().is_ok());
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        assert!(Config::try_parse_from(["weather-edge", "--rate-limit", "lots"]).is_err());
    }
}
