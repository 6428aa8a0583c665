use async_trait::async_trait;
use lynx_core::{CacheResult, LinkCache, LinkRecord, ShortCode};
use moka::future::Cache;
use moka::Expiry;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// An in-memory cache implementation using Moka.
///
/// Useful for single-node deployments and as the cache harness in
/// tests. Each entry carries its own TTL, matching the per-key
/// expiration the Redis implementation gets from `SETEX`.
#[derive(Debug, Clone)]
pub struct MokaLinkCache {
    cache: Cache<String, CachedLink>,
}

#[derive(Debug, Clone)]
struct CachedLink {
    record: LinkRecord,
    ttl: Duration,
}

struct PerEntryTtl;

impl Expiry<String, CachedLink> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedLink,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

impl MokaLinkCache {
    /// Creates a new Moka link cache with a default capacity of
    /// 10,000 entries.
    pub fn new() -> Self {
        Self::with_capacity(10_000)
    }

    /// Creates a new Moka link cache with a custom maximum capacity.
    pub fn with_capacity(max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryTtl)
            .build();
        Self { cache }
    }
}

impl Default for MokaLinkCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LinkCache for MokaLinkCache {
    async fn get(&self, code: &ShortCode) -> CacheResult<Option<LinkRecord>> {
        trace!(code = %code, "Fetching link record from Moka cache");

        let key = code.as_str().to_string();
        match self.cache.get(&key).await {
            Some(entry) => {
                debug!(code = %code, "Cache hit in Moka");
                Ok(Some(entry.record))
            }
            None => {
                trace!(code = %code, "Cache miss in Moka");
                Ok(None)
            }
        }
    }

    async fn set(&self, code: &ShortCode, record: &LinkRecord, ttl: Duration) -> CacheResult<()> {
        trace!(code = %code, ttl_secs = ttl.as_secs(), "Storing link record in Moka cache");

        let key = code.as_str().to_string();
        let entry = CachedLink {
            record: record.clone(),
            ttl,
        };
        self.cache.insert(key, entry).await;
        debug!(code = %code, "Cached record in Moka");
        Ok(())
    }

    async fn del(&self, code: &ShortCode) -> CacheResult<()> {
        trace!(code = %code, "Removing link record from Moka cache");

        let key = code.as_str().to_string();
        self.cache.invalidate(&key).await;
        debug!(code = %code, "Removed record from Moka cache (if present)");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::Timestamp;

    const TTL: Duration = Duration::from_secs(3600);

    fn code(s: &str) -> ShortCode {
        ShortCode::new_unchecked(s)
    }

    fn test_record(url: &str) -> LinkRecord {
        LinkRecord {
            id: 1,
            original_url: url.to_string(),
            short_code: code("abc123"),
            custom_alias: None,
            created_at: Timestamp::now(),
            expires_at: None,
            last_accessed_at: None,
            access_count: 0,
            owner_id: None,
        }
    }

    #[tokio::test]
    async fn cache_get_and_set() {
        let cache = MokaLinkCache::new();
        let c = code("abc123");
        let record = test_record("https://example.com");

        assert!(cache.get(&c).await.unwrap().is_none());

        cache.set(&c, &record, TTL).await.unwrap();

        let result = cache.get(&c).await.unwrap();
        assert_eq!(result, Some(record));
    }

    #[tokio::test]
    async fn cache_del_removes_entry() {
        let cache = MokaLinkCache::new();
        let c = code("abc123");
        let record = test_record("https://example.com");

        cache.set(&c, &record, TTL).await.unwrap();
        assert!(cache.get(&c).await.unwrap().is_some());

        cache.del(&c).await.unwrap();

        assert!(cache.get(&c).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn cache_del_is_idempotent() {
        let cache = MokaLinkCache::new();
        let c = code("abc123");

        cache.del(&c).await.unwrap();
        assert!(cache.get(&c).await.unwrap().is_none());
        cache.del(&c).await.unwrap();
    }

    #[tokio::test]
    async fn entries_expire_after_their_ttl() {
        let cache = MokaLinkCache::with_capacity(100);
        let c = code("abc123");
        let record = test_record("https://example.com");

        cache
            .set(&c, &record, Duration::from_millis(50))
            .await
            .unwrap();
        assert!(cache.get(&c).await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(cache.get(&c).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn ttl_is_per_entry() {
        let cache = MokaLinkCache::with_capacity(100);
        let short = code("short1");
        let long = code("long12");
        let record = test_record("https://example.com");

        cache
            .set(&short, &record, Duration::from_millis(50))
            .await
            .unwrap();
        cache.set(&long, &record, TTL).await.unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(cache.get(&short).await.unwrap().is_none());
        assert!(cache.get(&long).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn cache_handles_many_entries() {
        let cache = MokaLinkCache::with_capacity(100);

        for i in 0..50 {
            let c = code(&format!("code{}", i));
            let record = test_record(&format!("https://example{}.com", i));
            cache.set(&c, &record, TTL).await.unwrap();
        }

        let c25 = code("code25");
        assert_eq!(
            cache.get(&c25).await.unwrap().unwrap().original_url,
            "https://example25.com"
        );
    }
}
