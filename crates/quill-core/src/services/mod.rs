//! Services - the use cases of the blog, written against the ports.

mod analytics;
mod assistant;
mod auth_gate;
mod categories;
pub mod live;
mod moderation;
mod publishing;
mod settings;

pub use analytics::{AnalyticsService, DEFAULT_RECENT_LIMIT, DEFAULT_USER_LIMIT, RANKING_SAMPLE, TrackEvent};
pub use assistant::AssistantService;
pub use auth_gate::{AuthGate, AuthResult, bearer_token};
pub use categories::CategoryService;
pub use moderation::{Commenter, ModerationService};
pub use publishing::ContentService;
pub use settings::SettingsService;

use crate::domain::ChangeEvent;
use crate::ports::ChangeFeed;

/// Publish a change event. Delivery is best effort: failures are logged, never returned.
async fn notify(feed: &dyn ChangeFeed, event: ChangeEvent) {
    if let Err(e) = feed.publish(event.clone()).await {
        tracing::warn!(collection = %event.collection, id = %event.id, error = %e, "Change event not delivered");
    }
}
