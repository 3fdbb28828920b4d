//! Telemetry initialization - tracing and alerting setup.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::observability::{AlertConfig, AlertLayer};

const DEFAULT_FILTER: &str = "info,api_server=debug,quill_infra=debug";

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// JSON lines instead of pretty output.
    pub json_logs: bool,
    pub service_name: String,
    pub alerts_enabled: bool,
    /// Slack/Discord-style webhook. Alerts go to stderr without one.
    pub alert_webhook_url: Option<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            json_logs: false,
            service_name: "quill-api".to_string(),
            alerts_enabled: true,
            alert_webhook_url: None,
        }
    }
}

impl TelemetryConfig {
    pub fn from_env() -> Self {
        Self {
            json_logs: std::env::var("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
            service_name: std::env::var("SERVICE_NAME").unwrap_or_else(|_| "quill-api".to_string()),
            alerts_enabled: std::env::var("ALERTS_ENABLED")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
            alert_webhook_url: std::env::var("ALERT_WEBHOOK_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
        }
    }
}

/// Initialize tracing and alerting. Call once, inside the runtime.
pub fn init_telemetry(config: &TelemetryConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let alert_layer = config.alerts_enabled.then(|| match &config.alert_webhook_url {
        Some(url) => AlertLayer::webhook(url.clone(), AlertConfig::default()),
        None => AlertLayer::console(AlertConfig::default()),
    });

    if config.json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .with(alert_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .with(alert_layer)
            .init();
    }

    tracing::info!(
        service = %config.service_name,
        json_logs = config.json_logs,
        alerts_enabled = config.alerts_enabled,
        webhook = config.alert_webhook_url.is_some(),
        "Telemetry initialized"
    );
}
