use std::sync::Arc;

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use thiserror::Error;

use super::counter::count_marker;
use super::models::{StatsReport, StatsResult, Tally};
use crate::allowance::{AllowanceClock, AllowanceWindow};
use crate::cache::{normalize_user_id, ProfileCache};
use crate::config::StatsConfig;
use crate::error::HttpError;
use crate::impl_into_response;
use crate::social::{Post, PostQuery, SocialClient, SocialError, UserProfile};

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("User id {user_id} matched {count} profiles")]
    AmbiguousUser { user_id: String, count: usize },

    #[error(transparent)]
    Fetch(#[from] SocialError),
}

impl HttpError for StatsError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::UserNotFound(_) => StatusCode::NOT_FOUND,
            Self::AmbiguousUser { .. } => StatusCode::CONFLICT,
            Self::Fetch(e) => e.status_code(),
        }
    }

    fn error_code(&self) -> Option<&'static str> {
        match self {
            Self::UserNotFound(_) => Some("USER_NOT_FOUND"),
            Self::AmbiguousUser { .. } => Some("AMBIGUOUS_USER"),
            Self::Fetch(e) => e.error_code(),
        }
    }
}

impl StatsError {
    /// The id did not resolve to exactly one profile
    pub fn is_lookup(&self) -> bool {
        matches!(self, Self::UserNotFound(_) | Self::AmbiguousUser { .. })
    }
}

impl_into_response!(StatsError);

/// Fold marker occurrences over a batch of posts.
///
/// Markers in a post's own text are sends; markers in its direct replies are
/// receives. Sends in posts created inside `window` also count toward the
/// allowance. Order of `posts` does not matter.
pub fn tally(posts: &[Post], marker: &str, window: &AllowanceWindow) -> Tally {
    posts.iter().fold(Tally::default(), |mut acc, post| {
        let sent = count_marker(post.text.as_deref(), marker);
        acc.sent += sent;
        if post.timestamp.is_some_and(|ts| window.contains(ts)) {
            acc.sent_since_reset += sent;
        }
        acc.received += post
            .replies
            .iter()
            .map(|reply| count_marker(reply.text.as_deref(), marker))
            .sum::<u64>();
        acc
    })
}

/// Computes per-user marker statistics against a shared social client
pub struct StatsService {
    client: Arc<dyn SocialClient>,
    profile_cache: ProfileCache,
    clock: AllowanceClock,
    marker: String,
    since: DateTime<Utc>,
    max_posts: usize,
}

impl StatsService {
    /// Build the aggregator around a long-lived client handle.
    ///
    /// Marker, allowance cap, reset hour, epoch start and post cap all come
    /// from `config`; nothing is hard-coded here.
    pub fn new(client: Arc<dyn SocialClient>, profile_cache: ProfileCache, config: &StatsConfig) -> Self {
        Self {
            client,
            profile_cache,
            clock: AllowanceClock::new(config.reset_hour_utc, config.daily_allowance),
            marker: config.marker.clone(),
            since: config.epoch_start,
            max_posts: config.max_posts,
        }
    }

    /// Resolve a user id to exactly one profile. Results are cached.
    ///
    /// The id is trimmed and otherwise sent as-is; ids are case-sensitive.
    pub async fn resolve_user(&self, user_id: &str) -> Result<UserProfile, StatsError> {
        let user_id = normalize_user_id(user_id);

        if let Some(cached) = self.profile_cache.get(&user_id) {
            tracing::debug!(user_id = %user_id, "Profile cache hit");
            return Ok(cached);
        }

        tracing::debug!(user_id = %user_id, "Profile cache miss");

        let mut profiles = self.client.lookup_users(&[user_id.clone()]).await?;
        let profile = match profiles.len() {
            0 => return Err(StatsError::UserNotFound(user_id)),
            1 => profiles.remove(0),
            count => return Err(StatsError::AmbiguousUser { user_id, count }),
        };

        self.profile_cache.insert(user_id, profile.clone());
        Ok(profile)
    }

    /// The four-integer result for `user_id`, evaluated at the current time
    pub async fn compute_stats(&self, user_id: &str) -> Result<StatsResult, StatsError> {
        Ok(self.compute_report(user_id).await?.result)
    }

    /// Result plus the profile, allowance window and scan size behind it
    pub async fn compute_report(&self, user_id: &str) -> Result<StatsReport, StatsError> {
        self.compute_report_at(user_id, Utc::now()).await
    }

    /// Full pipeline with an explicit `now`: lookup, fetch, fold, combine.
    pub async fn compute_report_at(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<StatsReport, StatsError> {
        let user = self.resolve_user(user_id).await?;

        let query = PostQuery {
            author_id: user.id.clone(),
            since: self.since,
            limit: self.max_posts,
        };
        let posts = self.client.list_posts(&query).await?;

        // An exact fit is indistinguishable from a cut-off page
        let possibly_truncated = posts.len() >= self.max_posts;
        if possibly_truncated {
            tracing::warn!(
                user_id = %user.id,
                limit = self.max_posts,
                "Post cap reached, older activity is not counted"
            );
        }

        let window = self.clock.window_at(now);
        let tally = tally(&posts, &self.marker, &window);
        let result = StatsResult::new(tally.sent, tally.received, window.daily_used(tally.sent_since_reset));

        tracing::info!(
            user_id = %user.id,
            username = %user.username,
            posts = posts.len(),
            sent = result.total_sent,
            received = result.total_received,
            daily_used = result.daily_used,
            failed = result.failed_attempts,
            "Stats computed"
        );

        Ok(StatsReport {
            user,
            result,
            window,
            posts_scanned: posts.len(),
            possibly_truncated,
        })
    }
}
