//! Weather API credential resolution.
//!
//! The key can be bound as a plain string or as a provider that fetches it
//! asynchronously and may fail. Either way it is resolved to a plain,
//! non-empty string once per request before any use.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::error::{Result, WeatherError};

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("failed to read secret file {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("environment variable {0} is not set")]
    MissingVar(String),
}

/// Something that yields a secret string, possibly asynchronously.
#[async_trait]
pub trait SecretProvider: Send + Sync {
    async fn get(&self) -> Result<String, SecretError>;
}

/// Reads the secret from a file on each call, trimming surrounding whitespace.
#[derive(Debug, Clone)]
pub struct FileSecret {
    path: PathBuf,
}

impl FileSecret {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SecretProvider for FileSecret {
    async fn get(&self) -> Result<String, SecretError> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| SecretError::File {
                path: self.path.clone(),
                source,
            })?;
        Ok(contents.trim().to_string())
    }
}

/// Reads the secret from an environment variable at call time.
#[derive(Debug, Clone)]
pub struct EnvSecret {
    var: String,
}

impl EnvSecret {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

#[async_trait]
impl SecretProvider for EnvSecret {
    async fn get(&self) -> Result<String, SecretError> {
        std::env::var(&self.var).map_err(|_| SecretError::MissingVar(self.var.clone()))
    }
}

/// How the weather API key is bound in configuration.
#[derive(Clone)]
pub enum ApiKeyBinding {
    /// Nothing configured.
    Absent,
    /// The key itself.
    Literal(String),
    /// Fetched on demand.
    Provider(Arc<dyn SecretProvider>),
    /// A binding whose kind is not understood.
    Unsupported(String),
}

impl ApiKeyBinding {
    /// Build a binding from the configured source kind and value.
    ///
    /// `source` is `literal` (the default), `file` (value is a path) or `env`
    /// (value is a variable name). Any other kind is kept as `Unsupported`
    /// and reported when a request tries to use it.
    pub fn from_config(source: Option<&str>, value: Option<&str>) -> Self {
        let Some(value) = value else {
            return ApiKeyBinding::Absent;
        };

        match source.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            None | Some("") | Some("literal") => ApiKeyBinding::Literal(value.to_string()),
            Some("file") => ApiKeyBinding::Provider(Arc::new(FileSecret::new(value))),
            Some("env") => ApiKeyBinding::Provider(Arc::new(EnvSecret::new(value))),
            Some(other) => ApiKeyBinding::Unsupported(other.to_string()),
        }
    }

    pub async fn resolve(&self) -> Result<String> {
        let key = match self {
            ApiKeyBinding::Absent => return Err(WeatherError::CredentialMissing),
            ApiKeyBinding::Unsupported(kind) => {
                return Err(WeatherError::CredentialUnsupported(kind.clone()))
            }
            ApiKeyBinding::Literal(key) => key.clone(),
            ApiKeyBinding::Provider(provider) => provider
                .get()
                .await
                .map_err(|e| WeatherError::CredentialRetrieval(e.to_string()))?,
        };

        if key.is_empty() {
            return Err(WeatherError::CredentialEmpty);
        }
        Ok(key)
    }
}

impl fmt::Debug for ApiKeyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiKeyBinding::Absent => f.write_str("Absent"),
            ApiKeyBinding::Literal(_) => f.write_str("Literal(<redacted>)"),
            ApiKeyBinding::Provider(_) => f.write_str("Provider"),
            ApiKeyBinding::Unsupported(kind) => f.debug_tuple("Unsupported").field(kind).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticSecret(&'static str);

    #[async_trait]
    impl SecretProvider for StaticSecret {
        async fn get(&self) -> Result<String, SecretError> {
            Ok(self.0.to_string())
        }
    }

    #[tokio::test]
    async fn test_literal_binding() {
        let binding = ApiKeyBinding::from_config(None, Some("abc123"));
        assert_eq!(binding.resolve().await.unwrap(), "abc123");

        let binding = ApiKeyBinding::from_config(Some("LITERAL"), Some("abc123"));
        assert_eq!(binding.resolve().await.unwrap(), "abc123");
    }

    #[tokio::test]
    async fn test_absent_binding() {
        let binding = ApiKeyBinding::from_config(Some("file"), None);
        assert!(matches!(binding, ApiKeyBinding::Absent));
        assert!(matches!(
            binding.resolve().await,
            Err(WeatherError::CredentialMissing)
        ));
    }

    #[tokio::test]
    async fn test_unsupported_binding() {
        let binding = ApiKeyBinding::from_config(Some("vault"), Some("secret/weather"));
        match binding.resolve().await {
            Err(WeatherError::CredentialUnsupported(kind)) => assert_eq!(kind, "vault"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_literal_is_rejected() {
        let binding = ApiKeyBinding::from_config(None, Some(""));
        assert!(matches!(binding.resolve().await, Err(WeatherError::CredentialEmpty)));
    }

    #[tokio::test]
    async fn test_provider_returning_empty_is_rejected() {
        let binding = ApiKeyBinding::Provider(Arc::new(StaticSecret("")));
        assert!(matches!(binding.resolve().await, Err(WeatherError::CredentialEmpty)));
    }

    #[tokio::test]
    async fn test_file_provider() {
        let path = std::env::temp_dir().join(format!("weather-key-{}", std::process::id()));
        tokio::fs::write(&path, "file-key\n").await.unwrap();

        let binding = ApiKeyBinding::from_config(Some("file"), path.to_str());
        assert_eq!(binding.resolve().await.unwrap(), "file-key");

        tokio::fs::remove_file(&path).await.unwrap();
        assert!(matches!(
            binding.resolve().await,
            Err(WeatherError::CredentialRetrieval(_))
        ));
    }

    #[tokio::test]
    async fn test_env_provider_missing_var() {
        let binding =
            ApiKeyBinding::from_config(Some("env"), Some("WEATHER_EDGE_TEST_UNSET_VARIABLE"));
        match binding.resolve().await {
            Err(WeatherError::CredentialRetrieval(msg)) => {
                assert!(msg.contains("WEATHER_EDGE_TEST_UNSET_VARIABLE"))
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_debug_redacts_literal() {
        let binding = ApiKeyBinding::Literal("super-secret".into());
        assert!(!format!("{binding:?}").contains("super-secret"));
    }
}
