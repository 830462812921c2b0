//! Keyed response cache with a fixed time to live.
//!
//! Entries go stale only by expiry or an explicit [`ResponseCache::clear`];
//! no write path invalidates them. Callers must key solely on what the
//! cached bytes depend on — a page cached here is served to every client
//! asking for the same key, so per-user content must never go through it.

use axum::body::Bytes;
use moka::future::Cache as MokaCache;
use std::{
    fmt::{Debug, Formatter},
    hash::Hash,
    time::Duration,
};

pub struct ResponseCache<K> {
    inner: MokaCache<K, Bytes>,
}

impl<K> ResponseCache<K>
where
    K: Hash + Eq + Send + Sync + Clone + 'static,
{
    #[must_use]
    pub fn new(time_to_live: Duration) -> Self {
        Self {
            inner: MokaCache::builder().time_to_live(time_to_live).build(),
        }
    }

    pub async fn get(&self, key: &K) -> Option<Bytes> {
        self.inner.get(key).await
    }

    pub async fn insert(&self, key: K, body: Bytes) {
        self.inner.insert(key, body).await;
    }

    /// Drop every entry immediately. Administrative and test use only; the
    /// serving path relies purely on expiry.
    pub fn clear(&self) {
        self.inner.invalidate_all();
    }
}

impl<K> Clone for ResponseCache<K> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K> Debug for ResponseCache<K> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use crate::server::cache::ResponseCache;
    use axum::body::Bytes;
    use std::time::Duration;

    #[tokio::test]
    async fn serves_identical_bytes_within_ttl() {
        let cache = ResponseCache::new(Duration::from_secs(20));
        let body = Bytes::from_static(b"rendered page");

        cache.insert(1, body.clone()).await;

        // The underlying data may change; the cached bytes must not.
        assert_eq!(cache.get(&1).await, Some(body.clone()));
        assert_eq!(cache.get(&1).await, Some(body));
    }

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let cache = ResponseCache::new(Duration::from_millis(50));

        cache.insert(1, Bytes::from_static(b"old")).await;
        assert!(cache.get(&1).await.is_some());

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(cache.get(&1).await, None);
    }

    #[tokio::test]
    async fn clear_empties_immediately() {
        let cache = ResponseCache::new(Duration::from_secs(20));

        cache.insert(1, Bytes::from_static(b"one")).await;
        cache.insert(2, Bytes::from_static(b"two")).await;

        cache.clear();

        assert_eq!(cache.get(&1).await, None);
        assert_eq!(cache.get(&2).await, None);
    }

    #[tokio::test]
    async fn keys_do_not_collide() {
        let cache = ResponseCache::new(Duration::from_secs(20));

        cache.insert(1, Bytes::from_static(b"page one")).await;
        cache.insert(2, Bytes::from_static(b"page two")).await;

        assert_eq!(cache.get(&1).await, Some(Bytes::from_static(b"page one")));
        assert_eq!(cache.get(&2).await, Some(Bytes::from_static(b"page two")));
    }
}
