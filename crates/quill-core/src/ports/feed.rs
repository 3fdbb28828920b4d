//! Change feed port - document change notifications as a stream.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::domain::{ChangeEvent, Collection};

/// Infinite stream of changes for one collection. Dropping it unsubscribes.
pub type ChangeStream = BoxStream<'static, ChangeEvent>;

#[async_trait]
pub trait ChangeFeed: Send + Sync {
    async fn publish(&self, event: ChangeEvent) -> Result<(), FeedError>;

    async fn subscribe(&self, collection: Collection) -> Result<ChangeStream, FeedError>;
}

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("Failed to publish: {0}")]
    Publish(String),

    #[error("Failed to subscribe: {0}")]
    Subscribe(String),

    #[error("Connection error: {0}")]
    Connection(String),
}
