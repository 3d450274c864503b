use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ============================================================================
// Domain types (what the aggregator consumes)
// ============================================================================

/// A profile returned by the bulk user lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// A post, optionally carrying its direct replies inline.
///
/// Records with no text (deleted posts, media-only casts) deserialize with
/// `text: None` and contribute nothing to the counts.
#[allow(dead_code)] // author_id is carried for completeness; totals don't depend on it
#[derive(Debug, Clone, Deserialize)]
pub struct Post {
    #[serde(default)]
    pub author_id: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub replies: Vec<Post>,
}

/// Parameters of the post-listing query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostQuery {
    pub author_id: String,
    pub since: DateTime<Utc>,
    pub limit: usize,
}

// ============================================================================
// Wire envelopes (internal deserialization)
// ============================================================================

#[derive(Debug, Deserialize)]
pub(super) struct UserBulkResponse {
    #[serde(default)]
    pub users: Vec<UserProfile>,
}

#[derive(Debug, Deserialize)]
pub(super) struct PostListResponse {
    #[serde(default)]
    pub posts: Vec<Post>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ApiErrorBody {
    pub message: String,
}
