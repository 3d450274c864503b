use std::sync::Arc;

use indexmap::IndexSet;
use tokio::task::JoinSet;

use super::board::{StatsBoard, StatsSnapshot};
use crate::cache::normalize_user_id;
use crate::stats::{StatsError, StatsService};

/// Deduplicated, order-preserving list of user ids to poll; blanks are skipped.
pub fn build_user_list(users: &[String]) -> Vec<String> {
    users
        .iter()
        .map(|u| normalize_user_id(u))
        .filter(|u| !u.is_empty())
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect()
}

/// Recomputes stats from scratch and hands the outcome to the board
#[derive(Clone)]
pub struct StatsPoller {
    stats_service: Arc<StatsService>,
    board: Arc<StatsBoard>,
}

impl StatsPoller {
    /// Poller writing into `board`; clones share both handles
    pub fn new(stats_service: Arc<StatsService>, board: Arc<StatsBoard>) -> Self {
        Self {
            stats_service,
            board,
        }
    }

    /// Refresh one user and return the entry the board now holds.
    ///
    /// An id that does not resolve to exactly one profile is only recorded if
    /// the board already tracks it; otherwise the lookup error is returned and
    /// the board is left untouched. If this future is dropped before the
    /// computation finishes, nothing is published.
    pub async fn refresh(&self, user_id: &str) -> Result<StatsSnapshot, StatsError> {
        let user_id = normalize_user_id(user_id);
        tracing::debug!(user_id = %user_id, "Refreshing stats");

        match self.stats_service.compute_stats(&user_id).await {
            Ok(result) => Ok(self.board.publish(&user_id, Ok(result))),
            Err(e) if e.is_lookup() && !self.board.contains(&user_id) => {
                tracing::warn!(user_id = %user_id, error = %e, "Untracked user did not resolve");
                Err(e)
            }
            Err(e) => Ok(self.board.publish(&user_id, Err(e.to_string()))),
        }
    }

    /// Refresh every user concurrently; users are independent of each other.
    pub async fn refresh_all(&self, users: &[String]) -> usize {
        let mut tasks = JoinSet::new();
        for user_id in users {
            let poller = self.clone();
            let user_id = user_id.clone();
            tasks.spawn(async move {
                poller
                    .refresh(&user_id)
                    .await
                    .is_ok_and(|snapshot| snapshot.error.is_none())
            });
        }

        let mut succeeded = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(true) => succeeded += 1,
                Ok(false) => {}
                Err(e) => tracing::error!(error = %e, "Refresh task panicked or was cancelled"),
            }
        }

        tracing::info!(users = users.len(), succeeded = succeeded, "Poll round finished");
        succeeded
    }
}
