use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Notify;

use super::{Post, PostQuery, SocialClient, SocialError, UserProfile};

/// In-memory `SocialClient` for service tests
#[derive(Default)]
pub struct FakeSocialClient {
    pub users: Vec<UserProfile>,
    pub posts: Mutex<Vec<Post>>,
    pub fail_posts: AtomicBool,
    pub lookups: AtomicUsize,
    pub last_query: Mutex<Option<PostQuery>>,
    /// When set, `list_posts` parks until the gate is notified
    pub gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeSocialClient {
    pub fn new(users: Vec<UserProfile>, posts: Vec<Post>) -> Self {
        Self {
            users,
            posts: Mutex::new(posts),
            ..Self::default()
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_posts.store(failing, Ordering::SeqCst);
    }

    pub fn set_posts(&self, posts: Vec<Post>) {
        *self.posts.lock().unwrap() = posts;
    }

    /// Hold every later `list_posts` call until the returned gate is notified
    pub fn hold_posts(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }
}

#[async_trait]
impl SocialClient for FakeSocialClient {
    async fn lookup_users(&self, ids: &[String]) -> Result<Vec<UserProfile>, SocialError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .users
            .iter()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }

    async fn list_posts(&self, query: &PostQuery) -> Result<Vec<Post>, SocialError> {
        *self.last_query.lock().unwrap() = Some(query.clone());
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.fail_posts.load(Ordering::SeqCst) {
            return Err(SocialError::ApiError {
                status: 503,
                message: "unavailable".to_string(),
            });
        }
        let mut posts = self.posts.lock().unwrap().clone();
        posts.truncate(query.limit);
        Ok(posts)
    }
}

pub fn profile(id: &str, username: &str) -> UserProfile {
    UserProfile {
        id: id.to_string(),
        username: username.to_string(),
        display_name: None,
    }
}

pub fn post(text: &str, timestamp: Option<DateTime<Utc>>, replies: &[&str]) -> Post {
    Post {
        author_id: "3".to_string(),
        text: Some(text.to_string()),
        timestamp,
        replies: replies
            .iter()
            .map(|r| Post {
                author_id: "99".to_string(),
                text: Some(r.to_string()),
                timestamp,
                replies: Vec::new(),
            })
            .collect(),
    }
}
