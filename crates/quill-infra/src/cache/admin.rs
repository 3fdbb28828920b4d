//! Admin allow-list lookups fronted by a short-lived cache.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use quill_core::RepoError;
use quill_core::ports::{AdminDirectory, Cache};

/// Wraps an [`AdminDirectory`] and remembers answers for `ttl`.
///
/// Both positive and negative answers are cached, so a revoked or newly granted
/// admin may see the old answer until the entry expires. Lookup failures are
/// never cached.
pub struct CachedAdminDirectory {
    inner: Arc<dyn AdminDirectory>,
    cache: Arc<dyn Cache>,
    ttl: Duration,
}

impl CachedAdminDirectory {
    pub fn new(inner: Arc<dyn AdminDirectory>, cache: Arc<dyn Cache>, ttl: Duration) -> Self {
        Self { inner, cache, ttl }
    }

    fn key(user_id: &str) -> String {
        format!("admin:{user_id}")
    }
}

#[async_trait]
impl AdminDirectory for CachedAdminDirectory {
    async fn is_admin(&self, user_id: &str) -> Result<bool, RepoError> {
        let key = Self::key(user_id);
        match self.cache.get(&key).await.as_deref() {
            Some("1") => return Ok(true),
            Some("0") => return Ok(false),
            _ => {}
        }

        let is_admin = self.inner.is_admin(user_id).await?;
        let flag = if is_admin { "1" } else { "0" };
        if let Err(e) = self.cache.set(&key, flag, Some(self.ttl)).await {
            tracing::warn!(user_id = %user_id, error = %e, "Failed to cache admin lookup");
        }
        Ok(is_admin)
    }

    async fn grant(&self, user_id: &str) -> Result<(), RepoError> {
        self.inner.grant(user_id).await?;
        if let Err(e) = self.cache.delete(&Self::key(user_id)).await {
            tracing::warn!(user_id = %user_id, error = %e, "Failed to invalidate admin cache entry");
        }
        Ok(())
    }
}
