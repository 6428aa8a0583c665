use crate::identity::UserId;
use crate::shortcode::ShortCode;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Strips the trailing slash from a URL.
///
/// This is the only normalization the core performs; any further URL
/// validation belongs to the request-handling boundary.
pub fn normalize_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// A stored link record: one shortened URL together with its access
/// statistics and ownership.
///
/// This is also the cache payload. All fields are required for a cache
/// entry to deserialize, including the store-assigned `id`, so records
/// read back from the cache carry the authoritative identifier.
/// Timestamps serialize as ISO-8601 strings, `null` when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
    /// Store-assigned identifier, immutable after creation.
    pub id: i64,
    /// The normalized original URL (trailing slash stripped).
    pub original_url: String,
    /// The unique short code used for lookup.
    pub short_code: ShortCode,
    /// The user-chosen alias, retained for display even though it equals
    /// `short_code` when present.
    pub custom_alias: Option<String>,
    /// When the record was created.
    pub created_at: Timestamp,
    /// When the record expires for redirect purposes, if ever.
    /// Expired records are kept, not deleted.
    pub expires_at: Option<Timestamp>,
    /// When the record was last resolved for a redirect.
    pub last_accessed_at: Option<Timestamp>,
    /// Number of successful redirects. Monotonically non-decreasing.
    pub access_count: u64,
    /// The creating user, absent for anonymous creation.
    pub owner_id: Option<UserId>,
}

impl LinkRecord {
    /// Whether the record has expired relative to `now`.
    ///
    /// Expired records remain visible through lookups; callers on the
    /// redirect path use this to classify them as expired.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at < now)
    }
}

/// A link to be inserted. The store assigns `id`, `created_at`, and a
/// zero `access_count`.
#[derive(Debug, Clone)]
pub struct NewLink {
    /// The normalized original URL.
    pub original_url: String,
    /// The short code to register, already conflict-checked or
    /// freshly generated.
    pub short_code: ShortCode,
    /// The user-chosen alias, if any.
    pub custom_alias: Option<String>,
    /// When the record expires, if ever.
    pub expires_at: Option<Timestamp>,
    /// The creating user, absent for anonymous creation.
    pub owner_id: Option<UserId>,
}

/// A partial update to a link record.
///
/// Only `original_url` and `expires_at` are mutable. A `None` field is
/// left untouched; `expires_at: Some(None)` clears the expiry.
#[derive(Debug, Clone, Default)]
pub struct LinkChanges {
    pub original_url: Option<String>,
    pub expires_at: Option<Option<Timestamp>>,
}
