//! Redis cache implementation over a managed connection.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

use quill_core::ports::{Cache, CacheError};

/// Redis connection configuration shared by every Redis-backed adapter.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis URL (e.g., redis://localhost:6379)
    pub url: String,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Prefix applied to every key and channel
    pub key_prefix: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            connect_timeout: Duration::from_secs(5),
            key_prefix: "quill".to_string(),
        }
    }
}

impl RedisConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            connect_timeout: Duration::from_secs(
                std::env::var("REDIS_CONNECT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            ),
            key_prefix: std::env::var("REDIS_KEY_PREFIX").unwrap_or_else(|_| "quill".to_string()),
        }
    }

    pub fn key(&self, suffix: &str) -> String {
        format!("{}:{}", self.key_prefix, suffix)
    }

    /// Open a managed connection, giving up after `connect_timeout`.
    pub async fn connect(&self) -> Result<(Client, ConnectionManager), String> {
        let client = Client::open(self.url.as_str()).map_err(|e| e.to_string())?;
        let conn = tokio::time::timeout(self.connect_timeout, ConnectionManager::new(client.clone()))
            .await
            .map_err(|_| "Connection timed out".to_string())?
            .map_err(|e| e.to_string())?;
        Ok((client, conn))
    }
}

/// Redis-backed cache implementation.
pub struct RedisCache {
    conn: ConnectionManager,
    config: RedisConfig,
}

impl RedisCache {
    pub async fn new(config: RedisConfig) -> Result<Self, CacheError> {
        let (_, conn) = config.connect().await.map_err(CacheError::Connection)?;
        tracing::info!(url = %config.url, "Connected to Redis cache");
        Ok(Self { conn, config })
    }

    /// Create from environment configuration.
    pub async fn from_env() -> Result<Self, CacheError> {
        Self::new(RedisConfig::from_env()).await
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Option<String> {
        let mut conn = self.conn.clone();
        match conn.get::<_, Option<String>>(self.config.key(key)).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Redis GET failed");
                None
            }
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let key = self.config.key(key);

        match ttl {
            Some(duration) => conn
                .set_ex::<_, _, ()>(key, value, duration.as_secs().max(1))
                .await
                .map_err(|e| CacheError::Operation(e.to_string())),
            None => conn
                .set::<_, _, ()>(key, value)
                .await
                .map_err(|e| CacheError::Operation(e.to_string())),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(self.config.key(key))
            .await
            .map_err(|e| CacheError::Operation(e.to_string()))
    }
}
