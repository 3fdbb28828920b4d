//! Alerting layer for tracing.
//!
//! Events at or above the configured level are copied onto a channel and
//! delivered to an [`AlertSender`] by a background task, so logging never
//! waits on the network.

use std::fmt::Write as _;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{Layer, layer::Context};

#[derive(Debug, Clone)]
pub struct AlertMessage {
    pub level: String,
    pub message: String,
    pub target: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub fields: Vec<(String, String)>,
}

impl AlertMessage {
    /// One-line rendering used by both senders.
    pub fn summary(&self) -> String {
        let mut out = format!("[{}] {}: {}", self.level, self.target, self.message);
        for (key, value) in &self.fields {
            let _ = write!(out, " {key}={value}");
        }
        out
    }
}

#[derive(Debug, Clone)]
pub struct AlertConfig {
    /// Least severe level that raises an alert.
    pub min_level: Level,
    /// Alerts queued beyond this are dropped.
    pub buffer_size: usize,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            min_level: Level::ERROR,
            buffer_size: 100,
        }
    }
}

#[async_trait::async_trait]
pub trait AlertSender: Send + Sync {
    async fn send(&self, alert: AlertMessage) -> Result<(), AlertError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("Failed to send alert: {0}")]
    SendError(String),
}

/// Writes alerts to stderr.
pub struct ConsoleAlertSender;

#[async_trait::async_trait]
impl AlertSender for ConsoleAlertSender {
    async fn send(&self, alert: AlertMessage) -> Result<(), AlertError> {
        eprintln!("ALERT {} {}", alert.timestamp.to_rfc3339(), alert.summary());
        Ok(())
    }
}

/// Posts alerts to a chat webhook (Slack, Discord and compatible).
pub struct WebhookAlertSender {
    url: String,
    client: reqwest::Client,
}

impl WebhookAlertSender {
    pub fn new(url: String) -> Self {
        Self {
            url,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl AlertSender for WebhookAlertSender {
    async fn send(&self, alert: AlertMessage) -> Result<(), AlertError> {
        let payload = serde_json::json!({
            "text": format!("*quill-api alert* ({})\n{}", alert.timestamp.to_rfc3339(), alert.summary())
        });

        self.client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(|e| AlertError::SendError(e.to_string()))?;

        Ok(())
    }
}

pub struct AlertLayer {
    sender: mpsc::Sender<AlertMessage>,
    min_level: Level,
}

impl AlertLayer {
    /// Must be called inside a Tokio runtime: delivery runs on a spawned task.
    pub fn new(alert_sender: Arc<dyn AlertSender>, config: AlertConfig) -> Self {
        let (tx, mut rx) = mpsc::channel::<AlertMessage>(config.buffer_size.max(1));

        tokio::spawn(async move {
            while let Some(alert) = rx.recv().await {
                if let Err(e) = alert_sender.send(alert).await {
                    eprintln!("{}", e);
                }
            }
        });

        Self {
            sender: tx,
            min_level: config.min_level,
        }
    }

    pub fn console(config: AlertConfig) -> Self {
        Self::new(Arc::new(ConsoleAlertSender), config)
    }

    pub fn webhook(url: String, config: AlertConfig) -> Self {
        Self::new(Arc::new(WebhookAlertSender::new(url)), config)
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: Vec<(String, String)>,
}

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.fields
                .push((field.name().to_string(), format!("{:?}", value)));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields
                .push((field.name().to_string(), value.to_string()));
        }
    }
}

impl<S> Layer<S> for AlertLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        // Lower levels are more severe: ERROR < WARN < INFO.
        if *event.metadata().level() > self.min_level {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let alert = AlertMessage {
            level: event.metadata().level().to_string(),
            message: visitor.message,
            target: event.metadata().target().to_string(),
            timestamp: chrono::Utc::now(),
            fields: visitor.fields,
        };

        let _ = self.sender.try_send(alert);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tracing_subscriber::layer::SubscriberExt;

    struct Forward(mpsc::UnboundedSender<AlertMessage>);

    #[async_trait::async_trait]
    impl AlertSender for Forward {
        async fn send(&self, alert: AlertMessage) -> Result<(), AlertError> {
            self.0.send(alert).map_err(|e| AlertError::SendError(e.to_string()))
        }
    }

    #[tokio::test]
    async fn only_severe_events_are_forwarded() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let layer = AlertLayer::new(Arc::new(Forward(tx)), AlertConfig::default());
        let subscriber = tracing_subscriber::registry().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!("slow query");
            tracing::error!(post_id = 7, "write failed");
        });

        let alert = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(alert.level, "ERROR");
        assert_eq!(alert.message, "write failed");
        assert_eq!(alert.fields, vec![("post_id".to_string(), "7".to_string())]);
        assert!(alert.summary().ends_with("write failed post_id=7"));
        assert!(rx.try_recv().is_err());
    }
}
