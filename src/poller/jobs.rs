use std::sync::Arc;

use thiserror::Error;
use tokio_cron_scheduler::{Job, JobScheduler};

use super::service::{build_user_list, StatsPoller};
use crate::config::PollerConfig;

#[derive(Error, Debug)]
pub enum PollerError {
    #[error("Invalid cron expression: {0}")]
    InvalidCron(String),

    #[error("Scheduler error: {0}")]
    Scheduler(String),
}

/// Cron-driven background refresh of the tracked users
pub struct PollScheduler {
    scheduler: JobScheduler,
}

impl PollScheduler {
    /// Create an idle scheduler; nothing runs until `start`
    pub async fn new() -> Result<Self, PollerError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| PollerError::Scheduler(e.to_string()))?;
        Ok(Self { scheduler })
    }

    /// Register the poll job. Returns the number of users it will refresh.
    pub async fn schedule_polling(
        &self,
        poller: StatsPoller,
        config: &PollerConfig,
    ) -> Result<usize, PollerError> {
        let users = Arc::new(build_user_list(&config.users));
        let user_count = users.len();

        tracing::info!(cron = %config.cron, users = user_count, "Scheduling stats polling job");

        let job = Job::new_async(config.cron.as_str(), move |_uuid, _lock| {
            let poller = poller.clone();
            let users = Arc::clone(&users);

            Box::pin(async move {
                tracing::debug!(users = users.len(), "Poll job triggered");
                poller.refresh_all(&users).await;
            })
        })
        .map_err(|e| PollerError::InvalidCron(e.to_string()))?;

        let job_id = self
            .scheduler
            .add(job)
            .await
            .map_err(|e| PollerError::Scheduler(e.to_string()))?;

        tracing::debug!(job_id = %job_id, "Polling job registered");
        Ok(user_count)
    }

    pub async fn start(&self) -> Result<(), PollerError> {
        tracing::info!("Starting poll scheduler");
        self.scheduler
            .start()
            .await
            .map_err(|e| PollerError::Scheduler(e.to_string()))
    }

    /// Stop the scheduler; a poll round already running is not awaited
    pub async fn shutdown(&mut self) -> Result<(), PollerError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| PollerError::Scheduler(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::create_profile_cache;
    use crate::config::StatsConfig;
    use crate::poller::StatsBoard;
    use crate::social::testing::FakeSocialClient;
    use crate::stats::StatsService;
    use std::time::Duration;

    fn poller() -> StatsPoller {
        let stats = Arc::new(StatsService::new(
            Arc::new(FakeSocialClient::default()),
            create_profile_cache(Duration::from_secs(60)),
            &StatsConfig::default(),
        ));
        StatsPoller::new(stats, Arc::new(StatsBoard::new()))
    }

    #[tokio::test]
    async fn test_schedule_polling_counts_unique_users() {
        let scheduler = PollScheduler::new().await.unwrap();
        let config = PollerConfig {
            enabled: true,
            cron: "*/30 * * * * *".to_string(),
            users: vec!["3".to_string(), "3".to_string(), "5650".to_string()],
        };
        assert_eq!(scheduler.schedule_polling(poller(), &config).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_invalid_cron_is_rejected() {
        let scheduler = PollScheduler::new().await.unwrap();
        let config = PollerConfig {
            enabled: true,
            cron: "not a cron".to_string(),
            users: vec!["3".to_string()],
        };
        let err = scheduler.schedule_polling(poller(), &config).await.unwrap_err();
        assert!(matches!(err, PollerError::InvalidCron(_)));
    }
}
