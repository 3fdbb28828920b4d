//! In-memory change feed.
//!
//! Single process only. Used when Redis is not configured.

use std::collections::HashMap;

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;
use tokio::sync::{RwLock, broadcast};

use quill_core::domain::{ChangeEvent, Collection};
use quill_core::ports::{ChangeFeed, ChangeStream, FeedError};

/// Broadcast channel per collection.
pub struct InMemoryChangeFeed {
    channels: RwLock<HashMap<Collection, broadcast::Sender<ChangeEvent>>>,
    buffer_size: usize,
}

impl InMemoryChangeFeed {
    pub fn new(buffer_size: usize) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            buffer_size: buffer_size.max(1),
        }
    }

    async fn sender(&self, collection: Collection) -> broadcast::Sender<ChangeEvent> {
        if let Some(sender) = self.channels.read().await.get(&collection) {
            return sender.clone();
        }
        self.channels
            .write()
            .await
            .entry(collection)
            .or_insert_with(|| broadcast::channel(self.buffer_size).0)
            .clone()
    }
}

impl Default for InMemoryChangeFeed {
    fn default() -> Self {
        Self::new(100)
    }
}

#[async_trait]
impl ChangeFeed for InMemoryChangeFeed {
    async fn publish(&self, event: ChangeEvent) -> Result<(), FeedError> {
        let channels = self.channels.read().await;
        match channels.get(&event.collection) {
            // A send error only means nobody is listening right now.
            Some(sender) => {
                let delivered = sender.send(event.clone()).unwrap_or(0);
                tracing::debug!(collection = %event.collection, id = %event.id, delivered, "Change published");
            }
            None => {
                tracing::debug!(collection = %event.collection, "No subscribers for collection");
            }
        }
        Ok(())
    }

    async fn subscribe(&self, collection: Collection) -> Result<ChangeStream, FeedError> {
        let receiver = self.sender(collection).await.subscribe();
        tracing::debug!(collection = %collection, "Subscribed to change feed");

        let changes = stream::unfold(receiver, move |mut receiver| async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => return Some((event, receiver)),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(collection = %collection, skipped, "Change feed subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        });
        Ok(changes.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::domain::ChangeKind;
    use std::time::Duration;

    #[tokio::test]
    async fn subscriber_receives_events_for_its_collection() {
        let feed = InMemoryChangeFeed::default();
        let mut posts = feed.subscribe(Collection::Posts).await.unwrap();

        feed.publish(ChangeEvent::new(Collection::Comments, ChangeKind::Created, "c1"))
            .await
            .unwrap();
        feed.publish(ChangeEvent::new(Collection::Posts, ChangeKind::Updated, "p1"))
            .await
            .unwrap();

        let event = tokio::time::timeout(Duration::from_secs(1), posts.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.id, "p1");
        assert_eq!(event.kind, ChangeKind::Updated);
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_ok() {
        let feed = InMemoryChangeFeed::default();
        let result = feed
            .publish(ChangeEvent::new(Collection::Settings, ChangeKind::Updated, "site"))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn lagging_subscriber_skips_to_newest() {
        let feed = InMemoryChangeFeed::new(1);
        let mut stream = feed.subscribe(Collection::Categories).await.unwrap();

        for id in ["a", "b", "c"] {
            feed.publish(ChangeEvent::new(Collection::Categories, ChangeKind::Updated, id))
                .await
                .unwrap();
        }

        let event = stream.next().await.unwrap();
        assert_eq!(event.id, "c");
    }
}
