use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::allowance::AllowanceWindow;
use crate::social::UserProfile;

/// Marker statistics for one user at one point in time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsResult {
    /// Markers in the user's own posts
    pub total_sent: u64,
    /// Markers in replies to the user's posts
    pub total_received: u64,
    /// Allowance consumed in the current window, never above the cap
    pub daily_used: u64,
    /// Sends beyond the allowance (`total_sent - daily_used`, floored at zero)
    pub failed_attempts: u64,
}

impl StatsResult {
    /// Derives `failed_attempts` from the other counts
    pub fn new(total_sent: u64, total_received: u64, daily_used: u64) -> Self {
        Self {
            total_sent,
            total_received,
            daily_used,
            failed_attempts: total_sent.saturating_sub(daily_used),
        }
    }
}

/// Running totals folded over a batch of posts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub sent: u64,
    pub received: u64,
    pub sent_since_reset: u64,
}

/// Result plus the context it was computed in
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsReport {
    pub user: UserProfile,
    #[serde(flatten)]
    pub result: StatsResult,
    pub window: AllowanceWindow,
    pub posts_scanned: usize,
    /// The fetch returned `max_posts` posts, so older activity may be missing.
    /// Also set when the user has exactly `max_posts` posts in the window.
    pub possibly_truncated: bool,
}
