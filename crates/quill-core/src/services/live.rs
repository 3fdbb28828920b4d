//! Live queries: a snapshot now, and a fresh one after every change.

use std::future::Future;
use std::sync::Arc;

use futures::stream::{self, BoxStream, StreamExt};

use crate::error::DomainError;
use crate::ports::ChangeStream;

pub type SnapshotStream<T> = BoxStream<'static, Result<T, DomainError>>;

/// Turn a change stream into a lazy, infinite stream of snapshots.
///
/// `load` runs once when the stream is first polled and again for each change
/// event. Dropping the returned stream drops the subscription.
pub fn snapshots<T, F, Fut>(changes: ChangeStream, load: F) -> SnapshotStream<T>
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, DomainError>> + Send + 'static,
{
    let load = Arc::new(load);
    let initial = {
        let load = Arc::clone(&load);
        stream::once(async move { load().await })
    };
    let updates = changes.then(move |_event| {
        let load = Arc::clone(&load);
        async move { load().await }
    });
    initial.chain(updates).boxed()
}
