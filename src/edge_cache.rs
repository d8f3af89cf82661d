use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// A rendered retrieval response held at the edge.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub status: u16,
    pub content_type: String,
    pub cache_control: String,
    /// Additional headers stamped on the response (Open-Graph metadata for
    /// the raw rendering strategy).
    pub extra_headers: Vec<(String, String)>,
    pub body: Bytes,
}

/// Front-edge response cache, keyed by the canonical internal URL of a
/// stored object (see `keys::canonical_cache_url`).
///
/// A cached response for key K must not outlive the stored object for K:
/// the deletion flow evicts before deleting the blob. Eviction is
/// best-effort and at-least-once; a miss is never an error.
#[async_trait]
pub trait EdgeCache: Send + Sync {
    async fn lookup(&self, url: &str) -> Option<CachedResponse>;
    async fn store(&self, url: &str, response: CachedResponse);
    /// Returns whether an entry was present.
    async fn evict(&self, url: &str) -> bool;
}

/// In-process cache implementation. Durable state lives in the blob store;
/// this layer only short-circuits repeat retrievals, so a capped map
/// guarded by a RwLock is sufficient. At capacity, storing a new entry
/// drops an arbitrary existing one.
pub struct MemoryCache {
    capacity: usize,
    entries: RwLock<HashMap<String, CachedResponse>>,
}

const DEFAULT_CACHE_CAPACITY: usize = 1024;

impl MemoryCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EdgeCache for MemoryCache {
    async fn lookup(&self, url: &str) -> Option<CachedResponse> {
        self.entries.read().await.get(url).cloned()
    }

    async fn store(&self, url: &str, response: CachedResponse) {
        let mut entries = self.entries.write().await;
        if !entries.contains_key(url) && entries.len() >= self.capacity {
            if let Some(victim) = entries.keys().next().cloned() {
                entries.remove(&victim);
            }
        }
        entries.insert(url.to_string(), response);
    }

    async fn evict(&self, url: &str) -> bool {
        self.entries.write().await.remove(url).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(body: &'static str) -> CachedResponse {
        CachedResponse {
            status: 200,
            content_type: "text/plain".to_string(),
            cache_control: "public, max-age=604800".to_string(),
            extra_headers: Vec::new(),
            body: Bytes::from_static(body.as_bytes()),
        }
    }

    #[tokio::test]
    async fn store_then_lookup() {
        let cache = MemoryCache::new();
        cache.store("https://blob-origin/a", response("hello")).await;

        let hit = cache.lookup("https://blob-origin/a").await.unwrap();
        assert_eq!(hit.body, Bytes::from_static(b"hello"));
        assert_eq!(hit.status, 200);
    }

    #[tokio::test]
    async fn evict_removes_entry() {
        let cache = MemoryCache::new();
        cache.store("https://blob-origin/a", response("hello")).await;

        assert!(cache.evict("https://blob-origin/a").await);
        assert!(cache.lookup("https://blob-origin/a").await.is_none());
    }

    #[tokio::test]
    async fn evicting_missing_entry_is_not_an_error() {
        let cache = MemoryCache::new();
        assert!(!cache.evict("https://blob-origin/missing").await);
    }

    #[tokio::test]
    async fn store_at_capacity_drops_an_entry() {
        let cache = MemoryCache::with_capacity(2);
        cache.store("https://blob-origin/a", response("a")).await;
        cache.store("https://blob-origin/b", response("b")).await;
        cache.store("https://blob-origin/c", response("c")).await;

        // The newest entry is always kept; one of the older two made room.
        assert!(cache.lookup("https://blob-origin/c").await.is_some());
        let survivors = [
            cache.lookup("https://blob-origin/a").await,
            cache.lookup("https://blob-origin/b").await,
        ];
        assert_eq!(survivors.iter().filter(|s| s.is_some()).count(), 1);
    }

    #[tokio::test]
    async fn overwrite_at_capacity_keeps_other_entries() {
        let cache = MemoryCache::with_capacity(2);
        cache.store("https://blob-origin/a", response("a")).await;
        cache.store("https://blob-origin/b", response("b")).await;
        cache.store("https://blob-origin/a", response("a2")).await;

        assert!(cache.lookup("https://blob-origin/a").await.is_some());
        assert!(cache.lookup("https://blob-origin/b").await.is_some());
    }

    #[tokio::test]
    async fn store_overwrites() {
        let cache = MemoryCache::new();
        cache.store("https://blob-origin/a", response("first")).await;
        cache.store("https://blob-origin/a", response("second")).await;

        let hit = cache.lookup("https://blob-origin/a").await.unwrap();
        assert_eq!(hit.body, Bytes::from_static(b"second"));
    }
}
