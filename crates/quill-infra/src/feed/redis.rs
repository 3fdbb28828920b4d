//! Redis change feed over PUBLISH/SUBSCRIBE.

use async_trait::async_trait;
use futures::StreamExt;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

use quill_core::domain::{ChangeEvent, Collection};
use quill_core::ports::{ChangeFeed, ChangeStream, FeedError};

use crate::cache::RedisConfig;

/// Events are JSON on channel `<prefix>:changes:<collection>`.
pub struct RedisChangeFeed {
    conn: ConnectionManager,
    client: Client,
    config: RedisConfig,
}

impl RedisChangeFeed {
    pub async fn new(config: RedisConfig) -> Result<Self, FeedError> {
        let (client, conn) = config.connect().await.map_err(FeedError::Connection)?;
        tracing::info!(url = %config.url, "Connected to Redis change feed");
        Ok(Self {
            conn,
            client,
            config,
        })
    }

    /// Create from environment configuration.
    pub async fn from_env() -> Result<Self, FeedError> {
        Self::new(RedisConfig::from_env()).await
    }

    fn channel(&self, collection: Collection) -> String {
        self.config.key(&format!("changes:{collection}"))
    }
}

#[async_trait]
impl ChangeFeed for RedisChangeFeed {
    async fn publish(&self, event: ChangeEvent) -> Result<(), FeedError> {
        let payload = serde_json::to_string(&event).map_err(|e| FeedError::Publish(e.to_string()))?;
        let mut conn = self.conn.clone();
        conn.publish::<_, _, ()>(self.channel(event.collection), payload)
            .await
            .map_err(|e| FeedError::Publish(e.to_string()))
    }

    async fn subscribe(&self, collection: Collection) -> Result<ChangeStream, FeedError> {
        let channel = self.channel(collection);
        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(|e| FeedError::Connection(e.to_string()))?;
        pubsub
            .subscribe(&channel)
            .await
            .map_err(|e| FeedError::Subscribe(e.to_string()))?;

        tracing::debug!(channel = %channel, "Subscribed to Redis channel");

        let events = pubsub.into_on_message().filter_map(|msg| async move {
            let payload: String = match msg.get_payload() {
                Ok(p) => p,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to get message payload");
                    return None;
                }
            };
            match serde_json::from_str::<ChangeEvent>(&payload) {
                Ok(event) => Some(event),
                Err(e) => {
                    tracing::warn!(error = %e, "Dropping malformed change event");
                    None
                }
            }
        });
        Ok(events.boxed())
    }
}
