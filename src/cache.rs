use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::social::UserProfile;

/// Concurrent map whose entries expire after a fixed TTL
pub struct TtlCache<K, V> {
    data: DashMap<K, Expiring<V>>,
    ttl: Duration,
}

struct Expiring<V> {
    value: V,
    expires_at: Instant,
}

impl<K, V> TtlCache<K, V>
where
    K: std::hash::Hash + Eq + Clone,
    V: Clone,
{
    /// Empty cache; every entry lives for `ttl` after its last insert
    pub fn new(ttl: Duration) -> Self {
        Self {
            data: DashMap::new(),
            ttl,
        }
    }

    /// Live value for `key`; an expired entry is evicted on the way out
    pub fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        if let Some(entry) = self.data.get(key) {
            if entry.expires_at > now {
                return Some(entry.value.clone());
            }
        }
        self.data.remove_if(key, |_, entry| entry.expires_at <= now);
        None
    }

    /// Store `value` under `key`, replacing any previous entry and restarting its TTL
    pub fn insert(&self, key: K, value: V) {
        self.data.insert(
            key,
            Expiring {
                value,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Drop every expired entry, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let before = self.data.len();
        let now = Instant::now();
        self.data.retain(|_, entry| entry.expires_at > now);
        before.saturating_sub(self.data.len())
    }

    /// Entry count, expired-but-unpurged entries included
    pub fn len(&self) -> usize {
        self.data.len()
    }
}

/// Resolved user profiles keyed by normalized user id
pub type ProfileCache = Arc<TtlCache<String, UserProfile>>;

/// Shared profile cache for the stats service and its cleanup task
pub fn create_profile_cache(ttl: Duration) -> ProfileCache {
    Arc::new(TtlCache::new(ttl))
}

/// Canonical form of a user id: surrounding whitespace removed, case kept.
///
/// The same form is sent to the social API, used as the profile cache key and
/// used as the board key, so ids that differ only in case stay distinct.
pub fn normalize_user_id(user_id: &str) -> String {
    user_id.trim().to_string()
}

/// Background task purging expired profiles once an hour
pub fn start_cache_cleanup_task(cache: ProfileCache) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60 * 60));
        loop {
            interval.tick().await;
            let removed = cache.purge_expired();
            if removed > 0 {
                tracing::debug!(
                    removed = removed,
                    remaining = cache.len(),
                    "Profile cache cleanup completed"
                );
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(id: &str) -> UserProfile {
        UserProfile {
            id: id.to_string(),
            username: format!("user{}", id),
            display_name: None,
        }
    }

    #[test]
    fn test_insert_and_get() {
        let cache = create_profile_cache(Duration::from_secs(60));
        cache.insert("3".to_string(), profile("3"));
        assert_eq!(cache.get(&"3".to_string()), Some(profile("3")));
        assert_eq!(cache.get(&"4".to_string()), None);
    }

    #[test]
    fn test_expired_entry_is_evicted_on_get() {
        let cache: TtlCache<String, UserProfile> = TtlCache::new(Duration::from_millis(1));
        cache.insert("3".to_string(), profile("3"));
        std::thread::sleep(Duration::from_millis(10));
        assert_eq!(cache.get(&"3".to_string()), None);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_purge_expired() {
        let cache: TtlCache<String, UserProfile> = TtlCache::new(Duration::from_millis(1));
        cache.insert("1".to_string(), profile("1"));
        cache.insert("2".to_string(), profile("2"));
        std::thread::sleep(Duration::from_millis(10));
        assert_eq!(cache.purge_expired(), 2);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_normalize_user_id() {
        assert_eq!(normalize_user_id("  5650 "), "5650");
        assert_eq!(normalize_user_id("DWR.eth"), "DWR.eth");
        assert_ne!(normalize_user_id("DWR.eth"), normalize_user_id("dwr.eth"));
    }

    #[test]
    fn test_insert_replaces_and_refreshes_ttl() {
        let cache = create_profile_cache(Duration::from_secs(60));
        cache.insert("3".to_string(), profile("3"));
        cache.insert("3".to_string(), profile("4"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&"3".to_string()).map(|p| p.id), Some("4".to_string()));
    }
}
