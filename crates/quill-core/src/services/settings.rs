use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;

use crate::domain::{ChangeEvent, ChangeKind, Collection, SiteSettings};
use crate::error::DomainError;
use crate::ports::{ChangeFeed, SettingsRepository};

use super::notify;

pub struct SettingsService {
    repo: Arc<dyn SettingsRepository>,
    feed: Arc<dyn ChangeFeed>,
}

impl SettingsService {
    pub fn new(repo: Arc<dyn SettingsRepository>, feed: Arc<dyn ChangeFeed>) -> Self {
        Self { repo, feed }
    }

    /// Stored settings, writing the defaults on first access.
    pub async fn get(&self) -> Result<SiteSettings, DomainError> {
        match self.repo.load().await? {
            Some(settings) => Ok(settings),
            None => {
                tracing::info!("No site settings stored yet, writing defaults");
                Ok(self.repo.store(SiteSettings::default()).await?)
            }
        }
    }

    /// Merge a JSON patch into the stored settings.
    pub async fn update(&self, patch: &Value) -> Result<SiteSettings, DomainError> {
        if !patch.is_object() {
            return Err(DomainError::invalid("settings patch must be a JSON object"));
        }
        let current = self.get().await?;
        let mut merged = current
            .merged(patch)
            .map_err(|e| DomainError::invalid(format!("invalid settings: {e}")))?;
        merged.updated_at = Some(Utc::now());

        let saved = self.repo.store(merged).await?;
        notify(self.feed.as_ref(), ChangeEvent::new(Collection::Settings, ChangeKind::Updated, "site")).await;
        Ok(saved)
    }

    pub async fn reset(&self) -> Result<SiteSettings, DomainError> {
        let defaults = SiteSettings {
            updated_at: Some(Utc::now()),
            ..SiteSettings::default()
        };
        let saved = self.repo.store(defaults).await?;
        tracing::info!("Site settings reset to defaults");
        notify(self.feed.as_ref(), ChangeEvent::new(Collection::Settings, ChangeKind::Updated, "site")).await;
        Ok(saved)
    }
}
