use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::Client;

use crate::error::{Result, WeatherError};
use crate::store::KeyValueStore;

/// Redis-backed store, shared by every instance pointed at the same server.
///
/// Uses plain GET and SETEX. No script or transaction wraps the pair, so
/// concurrent callers see the same race as any other backend.
#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
}

impl RedisStore {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = Client::open(redis_url)
            .map_err(|e| WeatherError::Store(format!("Failed to create Redis client: {}", e)))?;

        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| WeatherError::Store(format!("Failed to connect to Redis: {}", e)))?;

        Ok(Self { connection })
    }

    pub async fn ping(&self) -> Result<String> {
        let mut conn = self.connection.clone();
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(pong)
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection.clone();
        let value: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| WeatherError::Store(format!("GET failed: {}", e)))?;
        Ok(value)
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        // SETEX rejects a zero expiry
        let seconds = ttl.as_secs().max(1);
        let mut conn = self.connection.clone();
        let _: () = redis::cmd("SETEX")
            .arg(key)
            .arg(seconds)
            .arg(value)
            .query_async(&mut conn)
            .await
            .map_err(|e| WeatherError::Store(format!("SETEX failed: {}", e)))?;
        Ok(())
    }
}
