use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use jiff::Timestamp;
use lynx_core::repository::Result;
use lynx_core::{LinkChanges, LinkRecord, LinkRepository, NewLink, ShortCode, StorageError, UserId};
use std::sync::atomic::{AtomicI64, Ordering};

/// In-memory implementation of [`LinkRepository`] using DashMap.
///
/// DashMap's sharded locks allow concurrent access to different
/// buckets without blocking, and give us check-and-insert plus
/// in-place counter increments that hold up under concurrent
/// handlers, matching what the relational store provides through
/// its unique constraint and atomic UPDATE.
#[derive(Debug)]
pub struct InMemoryRepository {
    links: DashMap<String, LinkRecord>,
    next_id: AtomicI64,
}

impl InMemoryRepository {
    /// Creates a new in-memory repository.
    pub fn new() -> Self {
        Self {
            links: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    /// Creates a new in-memory repository with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            links: DashMap::with_capacity(capacity),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LinkRepository for InMemoryRepository {
    async fn insert(&self, link: NewLink) -> Result<LinkRecord> {
        let key = link.short_code.as_str().to_owned();

        // Entry-based check-and-insert: the shard lock is held across
        // the existence check, so racing inserts of the same code
        // cannot both succeed.
        match self.links.entry(key) {
            Entry::Occupied(_) => Err(StorageError::Conflict(link.short_code.to_string())),
            Entry::Vacant(slot) => {
                let record = LinkRecord {
                    id: self.next_id.fetch_add(1, Ordering::SeqCst),
                    original_url: link.original_url,
                    short_code: link.short_code,
                    custom_alias: link.custom_alias,
                    created_at: Timestamp::now(),
                    expires_at: link.expires_at,
                    last_accessed_at: None,
                    access_count: 0,
                    owner_id: link.owner_id,
                };
                slot.insert(record.clone());
                Ok(record)
            }
        }
    }

    async fn get_by_short_code(&self, code: &ShortCode) -> Result<Option<LinkRecord>> {
        // Expired records are returned as-is; expiry is classified at
        // redirect time, not filtered here.
        Ok(self.links.get(code.as_str()).map(|entry| entry.clone()))
    }

    async fn get_by_original_url(
        &self,
        original_url: &str,
        owner_id: Option<UserId>,
    ) -> Result<Option<LinkRecord>> {
        let found = self
            .links
            .iter()
            .find(|entry| {
                entry.original_url == original_url
                    && owner_id.is_none_or(|owner| entry.owner_id == Some(owner))
            })
            .map(|entry| entry.clone());
        Ok(found)
    }

    async fn update(&self, code: &ShortCode, changes: LinkChanges) -> Result<Option<LinkRecord>> {
        let Some(mut entry) = self.links.get_mut(code.as_str()) else {
            return Ok(None);
        };

        if let Some(original_url) = changes.original_url {
            entry.original_url = original_url;
        }
        if let Some(expires_at) = changes.expires_at {
            entry.expires_at = expires_at;
        }

        Ok(Some(entry.clone()))
    }

    async fn delete(&self, code: &ShortCode) -> Result<bool> {
        Ok(self.links.remove(code.as_str()).is_some())
    }

    async fn exists(&self, code: &ShortCode) -> Result<bool> {
        Ok(self.links.contains_key(code.as_str()))
    }

    async fn increment_access(&self, code: &ShortCode, now: Timestamp) -> Result<bool> {
        let Some(mut entry) = self.links.get_mut(code.as_str()) else {
            return Ok(false);
        };

        // The shard lock makes the read-modify-write atomic.
        entry.access_count += 1;
        entry.last_accessed_at = Some(now);
        Ok(true)
    }
}
