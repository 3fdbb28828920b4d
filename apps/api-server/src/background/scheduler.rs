//! Cron-style job scheduler using tokio-cron-scheduler.

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::config::AppConfig;
use crate::state::AppState;

/// Every minute, on the minute.
pub const RATE_LIMIT_SWEEP: &str = "0 * * * * *";

/// Cron job scheduler wrapper.
pub struct Scheduler {
    inner: JobScheduler,
    jobs: Vec<&'static str>,
}

impl Scheduler {
    pub async fn new() -> Result<Self, JobSchedulerError> {
        let inner = JobScheduler::new().await?;
        Ok(Self { inner, jobs: Vec::new() })
    }

    /// Add a named cron job (six fields, seconds first).
    pub async fn add_cron<F, Fut>(
        &mut self,
        name: &'static str,
        schedule: &str,
        task: F,
    ) -> Result<uuid::Uuid, JobSchedulerError>
    where
        F: Fn() -> Fut + Send + Sync + Clone + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let job = Job::new_async(schedule, move |_uuid, _lock| {
            let task = task.clone();
            Box::pin(async move {
                task().await;
            })
        })?;

        let id = self.inner.add(job).await?;
        self.jobs.push(name);
        tracing::info!(job = name, schedule = %schedule, job_id = %id, "Cron job registered");
        Ok(id)
    }

    pub fn jobs(&self) -> &[&'static str] {
        &self.jobs
    }

    pub async fn start(&self) -> Result<(), JobSchedulerError> {
        self.inner.start().await?;
        tracing::info!(jobs = ?self.jobs, "Scheduler started");
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<(), JobSchedulerError> {
        self.inner.shutdown().await?;
        tracing::info!("Scheduler stopped");
        Ok(())
    }
}

/// Register the housekeeping jobs and start the scheduler.
///
/// Expired rate-limit windows are swept every minute, always. `SCHEDULER_ENABLED=false`
/// only turns off the optional jobs, currently the `CATEGORY_RECOUNT_CRON` recount.
pub async fn start(state: &AppState, config: &AppConfig) -> Result<Scheduler, JobSchedulerError> {
    let mut scheduler = Scheduler::new().await?;

    let ai = state.ai_limiter.clone();
    let public = state.public_limiter.clone();
    scheduler
        .add_cron("rate-limit-sweep", RATE_LIMIT_SWEEP, move || {
            let ai = ai.clone();
            let public = public.clone();
            async move {
                let removed = ai.purge_expired().await + public.purge_expired().await;
                if removed > 0 {
                    tracing::debug!(removed, "Expired rate-limit entries purged");
                }
            }
        })
        .await?;

    match &config.category_recount_cron {
        Some(schedule) if config.scheduler_enabled => {
            let categories = state.categories.clone();
            scheduler
                .add_cron("category-recount", schedule, move || {
                    let categories = categories.clone();
                    async move {
                        if let Err(e) = categories.recalculate_counts().await {
                            tracing::error!(error = %e, "Scheduled category recount failed");
                        }
                    }
                })
                .await?;
        }
        Some(_) => tracing::info!("Scheduler disabled, category recount skipped"),
        None => {}
    }

    scheduler.start().await?;
    Ok(scheduler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::{config, state_with};

    const HOURLY: &str = "0 0 * * * *";

    #[actix_rt::test]
    async fn sweep_runs_even_when_scheduler_is_disabled() {
        let config = AppConfig {
            scheduler_enabled: false,
            category_recount_cron: Some(HOURLY.to_string()),
            ..config()
        };
        let state = state_with(&config).await;

        let mut scheduler = start(&state, &config).await.unwrap();
        assert_eq!(scheduler.jobs(), ["rate-limit-sweep"]);
        scheduler.shutdown().await.unwrap();
    }

    #[actix_rt::test]
    async fn recount_is_registered_when_enabled() {
        let config = AppConfig {
            category_recount_cron: Some(HOURLY.to_string()),
            ..config()
        };
        let state = state_with(&config).await;

        let mut scheduler = start(&state, &config).await.unwrap();
        assert_eq!(scheduler.jobs(), ["rate-limit-sweep", "category-recount"]);
        scheduler.shutdown().await.unwrap();
    }
}
