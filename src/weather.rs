//! Upstream weather API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Result, WeatherError};

pub const DEFAULT_WEATHER_API_URL: &str = "https://api.weatherapi.com/v1/current.json";

/// Current conditions for a city, as JSON.
#[async_trait]
pub trait WeatherApi: Send + Sync {
    /// Fails with [`WeatherError::Upstream`] when the API answers with a
    /// non-success status.
    async fn fetch_current(&self, city: &str, api_key: &str) -> Result<Value>;
}

pub struct HttpWeatherApi {
    client: Client,
    base_url: Url,
}

impl HttpWeatherApi {
    /// `timeout` bounds each upstream call; `None` waits indefinitely.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| {
            WeatherError::InvalidConfig(format!("invalid weather API URL {}: {}", base_url, e))
        })?;

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self { client, base_url })
    }

    /// Append `key` and `q` to the base URL using form encoding, so a space
    /// becomes `+`.
    pub fn request_url(&self, city: &str, api_key: &str) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("key", api_key)
            .append_pair("q", city);
        url
    }
}

#[async_trait]
impl WeatherApi for HttpWeatherApi {
    async fn fetch_current(&self, city: &str, api_key: &str) -> Result<Value> {
        let url = self.request_url(city, api_key);
        debug!(city = %city, host = ?self.base_url.host_str(), "Fetching current weather");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(city = %city, status = status.as_u16(), "Weather API returned an error status");
            return Err(WeatherError::Upstream {
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::Router;
    use std::collections::HashMap;

    async fn upstream(Query(params): Query<HashMap<String, String>>) -> axum::response::Response {
        match params.get("q").map(String::as_str) {
            Some("Nowhere") => StatusCode::NOT_FOUND.into_response(),
            Some("Broken") => "not json".into_response(),
            Some("Shanghai") => (
                [(axum::http::header::CONTENT_TYPE, "application/json")],
                r#"{"location":{"name":"Shanghai"},"current":{"temp_c":20}}"#,
            )
                .into_response(),
            _ => axum::Json(serde_json::json!({
                "location": params.get("q"),
                "key": params.get("key"),
                "temp": 20
            }))
            .into_response(),
        }
    }

    async fn spawn_upstream() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().route("/v1/current.json", get(upstream));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/v1/current.json", addr)
    }

    #[test]
    fn test_request_url_percent_encodes_city() {
        let api = HttpWeatherApi::new(DEFAULT_WEATHER_API_URL, None).unwrap();
        let url = api.request_url("São Paulo&x=1", "k");
        assert_eq!(
            url.as_str(),
            "https://api.weatherapi.com/v1/current.json?key=k&q=S%C3%A3o+Paulo%26x%3D1"
        );
    }

    #[test]
    fn test_request_url_form_encodes_spaces() {
        let api = HttpWeatherApi::new(DEFAULT_WEATHER_API_URL, None).unwrap();
        let url = api.request_url("New York", "k");
        assert_eq!(url.query(), Some("key=k&q=New+York"));
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            HttpWeatherApi::new("not a url", None),
            Err(WeatherError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_success_passes_json_through() {
        let api = HttpWeatherApi::new(&spawn_upstream().await, Some(Duration::from_secs(5))).unwrap();
        let body = api.fetch_current("Hangzhou", "secret").await.unwrap();
        assert_eq!(body["location"], "Hangzhou");
        assert_eq!(body["key"], "secret");
        assert_eq!(body["temp"], 20);
    }

    #[tokio::test]
    async fn test_fetch_keeps_object_key_order() {
        let api = HttpWeatherApi::new(&spawn_upstream().await, None).unwrap();
        let body = api.fetch_current("Shanghai", "secret").await.unwrap();
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"location":{"name":"Shanghai"},"current":{"temp_c":20}}"#
        );
    }

    #[tokio::test]
    async fn test_fetch_non_success_status() {
        let api = HttpWeatherApi::new(&spawn_upstream().await, None).unwrap();
        let err = api.fetch_current("Nowhere", "secret").await.unwrap_err();
        assert!(matches!(err, WeatherError::Upstream { status: 404 }));
    }

    #[tokio::test]
    async fn test_fetch_invalid_json() {
        let api = HttpWeatherApi::new(&spawn_upstream().await, None).unwrap();
        let err = api.fetch_current("Broken", "secret").await.unwrap_err();
        assert!(matches!(err, WeatherError::Json(_)));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let api = HttpWeatherApi::new(&format!("http://{}/", addr), None).unwrap();
        let err = api.fetch_current("Beijing", "secret").await.unwrap_err();
        assert!(matches!(err, WeatherError::Http(_)));
    }
}
