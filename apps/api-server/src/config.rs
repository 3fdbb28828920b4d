//! Application configuration.

use std::time::Duration;

use quill_core::ports::RateLimitQuota;
use quill_infra::DatabaseConfig;

/// Server configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: Option<DatabaseConfig>,
    /// Shared Redis for cache, change feed and the AI limiter. Off when `REDIS_URL` is unset.
    pub redis_enabled: bool,
    /// User ids granted admin at startup.
    pub bootstrap_admin_ids: Vec<String>,
    pub admin_cache_ttl: Duration,
    /// Per-user allowance on the AI endpoints.
    pub ai_rate_limit: RateLimitQuota,
    /// Per-IP allowance on public writes.
    pub public_rate_limit: RateLimitQuota,
    /// Key public writes on `Forwarded` / `X-Forwarded-For`. Only safe behind a proxy that sets them.
    pub trust_proxy_headers: bool,
    /// Gates optional cron jobs. The rate-limit sweep always runs.
    pub scheduler_enabled: bool,
    pub category_recount_cron: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database: None,
            redis_enabled: false,
            bootstrap_admin_ids: Vec::new(),
            admin_cache_ttl: Duration::from_secs(60),
            ai_rate_limit: RateLimitQuota::new(10, Duration::from_secs(60)),
            public_rate_limit: RateLimitQuota::new(30, Duration::from_secs(60)),
            trust_proxy_headers: false,
            scheduler_enabled: true,
            category_recount_cron: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: parse_env("PORT").unwrap_or(defaults.port),
            database: DatabaseConfig::from_env(),
            redis_enabled: std::env::var("REDIS_URL").is_ok_and(|url| !url.trim().is_empty()),
            bootstrap_admin_ids: std::env::var("BOOTSTRAP_ADMIN_IDS")
                .map(|ids| split_ids(&ids))
                .unwrap_or_default(),
            admin_cache_ttl: parse_env("ADMIN_CACHE_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.admin_cache_ttl),
            ai_rate_limit: quota_from_env("AI_RATE_LIMIT", defaults.ai_rate_limit),
            public_rate_limit: quota_from_env("PUBLIC_RATE_LIMIT", defaults.public_rate_limit),
            trust_proxy_headers: flag_from_env("TRUST_PROXY_HEADERS").unwrap_or(defaults.trust_proxy_headers),
            scheduler_enabled: flag_from_env("SCHEDULER_ENABLED").unwrap_or(defaults.scheduler_enabled),
            category_recount_cron: std::env::var("CATEGORY_RECOUNT_CRON")
                .ok()
                .filter(|s| !s.trim().is_empty()),
        }
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Anything but `false` / `0` is on.
fn flag_from_env(key: &str) -> Option<bool> {
    std::env::var(key).ok().map(|v| parse_flag(&v))
}

fn parse_flag(raw: &str) -> bool {
    !matches!(raw.trim(), "false" | "0")
}

/// `{prefix}_MAX_REQUESTS` and `{prefix}_WINDOW_SECS`. Zero values fall back to the default.
fn quota_from_env(prefix: &str, default: RateLimitQuota) -> RateLimitQuota {
    let max_requests = parse_env(&format!("{prefix}_MAX_REQUESTS"))
        .filter(|n: &u32| *n > 0)
        .unwrap_or(default.max_requests);
    let window = parse_env(&format!("{prefix}_WINDOW_SECS"))
        .filter(|s: &u64| *s > 0)
        .map(Duration::from_secs)
        .unwrap_or(default.window);
    RateLimitQuota::new(max_requests, window)
}

fn split_ids(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_ids_are_trimmed_and_blanks_skipped() {
        assert_eq!(split_ids(" a, b ,,c "), vec!["a", "b", "c"]);
        assert!(split_ids("").is_empty());
    }

    #[test]
    fn flags_are_on_unless_false_or_zero() {
        assert!(parse_flag("true"));
        assert!(parse_flag("yes"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag(" 0 "));
        assert!(!AppConfig::default().trust_proxy_headers);
    }

    #[test]
    fn defaults_match_the_documented_limits() {
        let config = AppConfig::default();
        assert_eq!(config.ai_rate_limit.max_requests, 10);
        assert_eq!(config.ai_rate_limit.window, Duration::from_secs(60));
        assert_eq!(config.bind_address(), ("127.0.0.1".to_string(), 8080));
    }
}
