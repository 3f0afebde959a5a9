use axum::http::{HeaderName, HeaderValue};

use crate::config::Config;
use crate::error::WeatherError;

/// Validates configuration objects for consistency and correctness
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates a Redis URL. Empty means the in-memory store.
    pub fn validate_redis_url(url: &str) -> Result<(), WeatherError> {
        let url = url.trim();
        if url.is_empty() {
            return Ok(());
        }

        if !url.starts_with("redis://") && !url.starts_with("rediss://") {
            return Err(WeatherError::InvalidConfig(
                "Redis URL must start with 'redis://' or 'rediss://'".to_string(),
            ));
        }

        Ok(())
    }

    /// Validates rate limit parameters
    pub fn validate_rate_limit(limit: u64, window_secs: u64) -> Result<(), WeatherError> {
        if limit == 0 {
            return Err(WeatherError::InvalidConfig(
                "Rate limit must be greater than 0".to_string(),
            ));
        }

        if window_secs == 0 {
            return Err(WeatherError::InvalidConfig(
                "Rate limit window must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Validates the upstream weather API URL
    pub fn validate_weather_api_url(url: &str) -> Result<(), WeatherError> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(WeatherError::InvalidConfig(format!(
                "Weather API URL '{}' must start with 'http://' or 'https://'",
                url
            )));
        }

        Ok(())
    }

    /// Validates the trusted client IP header name
    pub fn validate_client_ip_header(name: &str) -> Result<(), WeatherError> {
        HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
            WeatherError::InvalidConfig(format!("'{}' is not a valid header name", name))
        })?;

        Ok(())
    }

    /// Validates the comma-separated CORS allow-list
    pub fn validate_cors_origins(origins: &str) -> Result<(), WeatherError> {
        for origin in origins.split(',').map(str::trim) {
            if origin.is_empty() {
                continue;
            }
            if HeaderValue::from_str(origin).is_err() {
                return Err(WeatherError::InvalidConfig(format!(
                    "CORS origin '{}' is not a valid header value",
                    origin
                )));
            }
        }

        Ok(())
    }

    pub fn validate_default_city(city: &str) -> Result<(), WeatherError> {
        if city.trim().is_empty() {
            return Err(WeatherError::InvalidConfig(
                "Default city cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Validates the full service configuration.
    ///
    /// The API key is not checked; credential problems surface per request.
    pub fn validate_config(config: &Config) -> Result<(), WeatherError> {
        Self::validate_redis_url(&config.redis_url)?;
        Self::validate_rate_limit(config.rate_limit, config.window_secs)?;
        Self::validate_weather_api_url(&config.weather_api_url)?;
        Self::validate_client_ip_header(&config.client_ip_header)?;
        Self::validate_cors_origins(&config.cors_allowed_origins)?;
        Self::validate_default_city(&config.default_city)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_valid_redis_url() {
        assert!(ConfigValidator::validate_redis_url("redis://localhost:6379").is_ok());
        assert!(ConfigValidator::validate_redis_url("rediss://localhost:6379").is_ok());
        assert!(ConfigValidator::validate_redis_url("").is_ok());
    }

    #[test]
    fn test_invalid_redis_url() {
        assert!(ConfigValidator::validate_redis_url("http://localhost:6379").is_err());
    }

    #[test]
    fn test_valid_rate_limit() {
        assert!(ConfigValidator::validate_rate_limit(10, 60).is_ok());
        assert!(ConfigValidator::validate_rate_limit(30, 60).is_ok());
    }

    #[test]
    fn test_invalid_rate_limit() {
        assert!(ConfigValidator::validate_rate_limit(0, 60).is_err());
        assert!(ConfigValidator::validate_rate_limit(10, 0).is_err());
    }

    #[test]
    fn test_weather_api_url() {
        assert!(ConfigValidator::validate_weather_api_url("https://api.weatherapi.com/v1").is_ok());
        assert!(ConfigValidator::validate_weather_api_url("ftp://weather").is_err());
    }

    #[test]
    fn test_client_ip_header() {
        assert!(ConfigValidator::validate_client_ip_header("x-forwarded-for").is_ok());
        assert!(ConfigValidator::validate_client_ip_header("bad header").is_err());
    }

    #[test]
    fn test_cors_origins() {
        assert!(ConfigValidator::validate_cors_origins("http://localhost:3000, https://a.example").is_ok());
        assert!(ConfigValidator::validate_cors_origins("http://a.example\n").is_ok());
        assert!(ConfigValidator::validate_cors_origins("http://a.example\u{7f}").is_err());
    }

    #[test]
    fn test_validate_config() {
        let config = Config::try_parse_from(["weather-edge", "--redis-url", ""]).unwrap();
        assert!(ConfigValidator::validate_config(&config).is_ok());

        let config =
            Config::try_parse_from(["weather-edge", "--rate-limit", "0"]).unwrap();
        assert!(matches!(
            ConfigValidator::validate_config(&config),
            Err(WeatherError::InvalidConfig(_))
        ));
    }
}
