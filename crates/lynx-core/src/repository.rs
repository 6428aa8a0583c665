use crate::error::StorageError;
use crate::identity::UserId;
use crate::link::{LinkChanges, LinkRecord, NewLink};
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use jiff::Timestamp;

pub type Result<T> = std::result::Result<T, StorageError>;

/// The durable record store: the source of truth for link records.
///
/// Implementations must provide their own concurrency safety; the
/// resolver holds no shared mutable state of its own. In particular,
/// [`increment_access`](LinkRepository::increment_access) must be atomic
/// at the store so concurrent redirects never lose updates.
#[async_trait]
pub trait LinkRepository: Send + Sync + 'static {
    /// Inserts a new link and returns the stored record with its
    /// assigned id. Returns `Err(Conflict)` if the short code is taken.
    async fn insert(&self, link: NewLink) -> Result<LinkRecord>;

    /// Retrieves the record for a given short code.
    ///
    /// Expired records are still returned; expiry is a redirect-time
    /// policy, not a storage concern.
    async fn get_by_short_code(&self, code: &ShortCode) -> Result<Option<LinkRecord>>;

    /// Finds a record by its normalized original URL, optionally
    /// restricted to a single owner.
    async fn get_by_original_url(
        &self,
        original_url: &str,
        owner_id: Option<UserId>,
    ) -> Result<Option<LinkRecord>>;

    /// Applies a partial update and returns the updated record.
    /// Returns `None` if the code does not exist.
    async fn update(&self, code: &ShortCode, changes: LinkChanges) -> Result<Option<LinkRecord>>;

    /// Deletes the record for a given short code.
    /// Returns `true` if the record existed and was removed.
    async fn delete(&self, code: &ShortCode) -> Result<bool>;

    /// Checks whether a short code is already registered.
    async fn exists(&self, code: &ShortCode) -> Result<bool>;

    /// Atomically increments the access counter and stamps
    /// `last_accessed_at` with `now`.
    /// Returns `true` if a record existed for the code.
    async fn increment_access(&self, code: &ShortCode, now: Timestamp) -> Result<bool>;
}
