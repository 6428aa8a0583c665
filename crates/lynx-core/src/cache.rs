use crate::error::CacheError;
use crate::link::LinkRecord;
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use std::time::Duration;

pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// A cache for link records, keyed by short code.
///
/// This is the read-through accelerator in front of the durable store.
/// The cache is never the sole source of truth: any entry must be
/// re-derivable from the store record, and callers treat cache failures
/// as misses rather than operation failures.
#[async_trait]
pub trait LinkCache: Send + Sync + 'static {
    /// Get a link record from the cache.
    ///
    /// Returns `Ok(None)` if the key is not in the cache. A present but
    /// undecodable entry is an `Err(InvalidData)`, which callers fall
    /// back from.
    async fn get(&self, code: &ShortCode) -> CacheResult<Option<LinkRecord>>;

    /// Store a link record with the given TTL.
    ///
    /// The TTL bounds staleness in case an invalidation is missed.
    async fn set(&self, code: &ShortCode, record: &LinkRecord, ttl: Duration) -> CacheResult<()>;

    /// Remove a link record from the cache.
    ///
    /// Essential for handling link updates and deletions.
    /// It is not an error if the key does not exist.
    async fn del(&self, code: &ShortCode) -> CacheResult<()>;
}
