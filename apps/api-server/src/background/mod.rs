//! Background jobs.

#[cfg(feature = "scheduler")]
pub mod scheduler;

/// Sweep expired rate-limit windows on a plain interval. Used when the scheduler feature is off.
#[cfg(not(feature = "scheduler"))]
pub fn spawn_rate_limit_sweep(
    state: &crate::state::AppState,
    every: std::time::Duration,
) -> tokio::task::JoinHandle<()> {
    let ai = state.ai_limiter.clone();
    let public = state.public_limiter.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            let removed = ai.purge_expired().await + public.purge_expired().await;
            if removed > 0 {
                tracing::debug!(removed, "Expired rate-limit entries purged");
            }
        }
    })
}
