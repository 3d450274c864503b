use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use utoipa::ToSchema;

use crate::stats::StatsResult;

/// Latest known stats for one tracked user
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub user_id: String,
    /// Last successful result; kept when a later refresh fails
    pub result: Option<StatsResult>,
    /// Error from the most recent refresh, if it failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub updated_at: DateTime<Utc>,
    /// Completion order of the refresh that produced this entry
    pub sequence: u64,
}

/// In-memory, poll-and-replace view of the latest stats per user.
///
/// Last completed wins: whichever refresh finishes last replaces the user's
/// entry wholesale, regardless of when it started. Results are never merged.
/// A refresh that is abandoned before it finishes never calls `publish`, so
/// it cannot overwrite anything.
#[derive(Default)]
pub struct StatsBoard {
    entries: DashMap<String, StatsSnapshot>,
    sequence: AtomicU64,
}

impl StatsBoard {
    /// Empty board; entries appear only once a refresh for that user completes
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a finished refresh and return the entry now held for `user_id`.
    ///
    /// Failures keep the previous result and record the error.
    pub fn publish(&self, user_id: &str, outcome: Result<StatsResult, String>) -> StatsSnapshot {
        let failure = outcome.as_ref().err().cloned();

        let (snapshot, had_previous) = match self.entries.entry(user_id.to_string()) {
            Entry::Occupied(mut entry) => {
                let previous = entry.get().result;
                let snapshot = self.snapshot(user_id, outcome, previous);
                entry.insert(snapshot.clone());
                (snapshot, previous.is_some())
            }
            Entry::Vacant(entry) => {
                let snapshot = self.snapshot(user_id, outcome, None);
                entry.insert(snapshot.clone());
                (snapshot, false)
            }
        };

        match failure {
            Some(error) => tracing::warn!(
                user_id = %user_id,
                error = %error,
                keeping_previous = had_previous,
                "Refresh failed"
            ),
            None => tracing::debug!(
                user_id = %user_id,
                sequence = snapshot.sequence,
                "Board updated"
            ),
        }

        snapshot
    }

    fn snapshot(
        &self,
        user_id: &str,
        outcome: Result<StatsResult, String>,
        previous: Option<StatsResult>,
    ) -> StatsSnapshot {
        let (result, error) = match outcome {
            Ok(result) => (Some(result), None),
            Err(error) => (previous, Some(error)),
        };
        StatsSnapshot {
            user_id: user_id.to_string(),
            result,
            error,
            updated_at: Utc::now(),
            sequence: self.sequence.fetch_add(1, Ordering::SeqCst) + 1,
        }
    }

    /// Whether `user_id` has ever been published
    pub fn contains(&self, user_id: &str) -> bool {
        self.entries.contains_key(user_id)
    }

    /// Entry for `user_id`, if a refresh for it has completed
    pub fn get(&self, user_id: &str) -> Option<StatsSnapshot> {
        self.entries.get(user_id).map(|entry| entry.value().clone())
    }

    /// All entries, ordered by user id
    pub fn all(&self) -> Vec<StatsSnapshot> {
        let mut snapshots: Vec<StatsSnapshot> =
            self.entries.iter().map(|entry| entry.value().clone()).collect();
        snapshots.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        snapshots
    }
}
