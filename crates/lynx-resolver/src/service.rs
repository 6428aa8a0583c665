use crate::error::{ResolverError, Result};
use jiff::Timestamp;
use lynx_core::{
    normalize_url, LinkCache, LinkChanges, LinkRecord, LinkRepository, NewLink, ShortCode,
    StorageError, UserId,
};
use lynx_generator::CodeGenerator;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Default TTL for cached link records (one hour).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// How many generated codes to try before giving up on a creation.
const MAX_GENERATE_ATTEMPTS: usize = 3;

/// Parameters for creating a shortened link.
#[derive(Debug, Clone)]
pub struct CreateLink {
    /// The original URL to shorten. Normalized on entry.
    pub original_url: String,
    /// Optional user-chosen alias, used as the short code when given.
    pub custom_alias: Option<ShortCode>,
    /// When the link expires, if ever.
    pub expires_at: Option<Timestamp>,
    /// The acting user, absent for anonymous creation.
    pub owner_id: Option<UserId>,
}

/// The link resolver: orchestrates every link operation against the
/// cache and the durable store.
///
/// Reads follow cache → store → cache repopulate. Creation pre-populates
/// the cache with the fresh record; every other mutation invalidates the
/// cache key instead of updating it in place, so derived fields are
/// never served stale. Cache failures degrade to store reads and are
/// never surfaced to callers; store failures are fatal to the operation.
#[derive(Debug, Clone)]
pub struct LinkResolver<R, C, G> {
    repository: Arc<R>,
    cache: Arc<C>,
    generator: Arc<G>,
    cache_ttl: Duration,
}

impl<R, C, G> LinkResolver<R, C, G>
where
    R: LinkRepository,
    C: LinkCache,
    G: CodeGenerator,
{
    /// Creates a resolver with the default cache TTL.
    pub fn new(repository: R, cache: C, generator: G) -> Self {
        Self {
            repository: Arc::new(repository),
            cache: Arc::new(cache),
            generator: Arc::new(generator),
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }

    /// Overrides the cache TTL.
    pub fn with_cache_ttl(mut self, cache_ttl: Duration) -> Self {
        self.cache_ttl = cache_ttl;
        self
    }

    /// Returns a reference to the underlying repository.
    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Returns a reference to the cache.
    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Creates a shortened link.
    ///
    /// Creation is idempotent per (normalized URL, owner): if the caller
    /// already shortened this URL, the existing record is returned
    /// unchanged. A taken custom alias fails with
    /// [`ResolverError::AliasConflict`]; generated codes are retried a
    /// bounded number of times against the store's uniqueness constraint.
    pub async fn create(&self, params: CreateLink) -> Result<LinkRecord> {
        let original_url = normalize_url(&params.original_url);

        if let Some(existing) = self
            .repository
            .get_by_original_url(&original_url, params.owner_id)
            .await?
        {
            if existing.owner_id == params.owner_id {
                debug!(code = %existing.short_code, "URL already shortened by this owner");
                return Ok(existing);
            }
        }

        if let Some(alias) = &params.custom_alias {
            if self.repository.exists(alias).await? {
                return Err(ResolverError::AliasConflict(alias.to_string()));
            }
        }

        let custom_alias = params
            .custom_alias
            .as_ref()
            .map(|alias| alias.as_str().to_string());
        let mut short_code = match params.custom_alias {
            Some(alias) => alias,
            None => self.generator.generate(),
        };
        let mut attempts_left = if custom_alias.is_some() {
            1
        } else {
            MAX_GENERATE_ATTEMPTS
        };

        loop {
            let link = NewLink {
                original_url: original_url.clone(),
                short_code: short_code.clone(),
                custom_alias: custom_alias.clone(),
                expires_at: params.expires_at,
                owner_id: params.owner_id,
            };

            match self.repository.insert(link).await {
                Ok(record) => {
                    // Freshly created and uncontended, so pre-populating
                    // the cache is safe here; every later mutation
                    // invalidates instead.
                    self.populate_cache(&record).await;
                    debug!(code = %record.short_code, "Created link");
                    return Ok(record);
                }
                Err(StorageError::Conflict(taken)) => {
                    attempts_left -= 1;
                    if custom_alias.is_some() {
                        // Lost the race for the alias after the
                        // existence check.
                        return Err(ResolverError::AliasConflict(taken));
                    }
                    if attempts_left == 0 {
                        return Err(ResolverError::Storage(StorageError::Conflict(taken)));
                    }
                    trace!(code = %taken, "Generated code collided, retrying");
                    short_code = self.generator.generate();
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Resolves a short code to its record, cache first.
    ///
    /// Cache misses, errors, and corrupt entries all fall back to the
    /// store; a successful store read repopulates the cache. Expired
    /// records are returned as-is; use
    /// [`resolve_redirect`](Self::resolve_redirect) on the redirect path.
    pub async fn lookup(&self, code: &ShortCode) -> Result<Option<LinkRecord>> {
        match self.cache.get(code).await {
            Ok(Some(record)) => {
                debug!(code = %code, "Resolved from cache");
                return Ok(Some(record));
            }
            Ok(None) => {
                trace!(code = %code, "Cache miss");
            }
            Err(e) => {
                // The cache is an optimization, not a dependency.
                warn!(code = %code, error = %e, "Cache read failed, falling back to store");
            }
        }

        let Some(record) = self.repository.get_by_short_code(code).await? else {
            trace!(code = %code, "Short code not found");
            return Ok(None);
        };

        self.populate_cache(&record).await;
        Ok(Some(record))
    }

    /// Returns the statistics view of a link: the full record including
    /// `access_count` and `last_accessed_at`.
    pub async fn stats(&self, code: &ShortCode) -> Result<Option<LinkRecord>> {
        self.lookup(code).await
    }

    /// Resolves a short code for a redirect, classifying expiry.
    ///
    /// An expired link is reported as [`ResolverError::Expired`], distinct
    /// from [`ResolverError::NotFound`]; the record itself is neither
    /// deleted nor evicted from the cache.
    pub async fn resolve_redirect(&self, code: &ShortCode) -> Result<LinkRecord> {
        let Some(record) = self.lookup(code).await? else {
            return Err(ResolverError::NotFound(code.to_string()));
        };

        if record.is_expired(Timestamp::now()) {
            debug!(code = %code, "Link has expired");
            return Err(ResolverError::Expired(code.to_string()));
        }

        Ok(record)
    }

    /// Applies a partial update to a link and invalidates its cache entry.
    ///
    /// Only `original_url` and `expires_at` are mutable; a provided URL
    /// is normalized. Ownership is checked by the caller at the request
    /// boundary. Returns `None` if the code does not exist.
    pub async fn update(
        &self,
        code: &ShortCode,
        mut changes: LinkChanges,
    ) -> Result<Option<LinkRecord>> {
        if let Some(url) = changes.original_url.take() {
            changes.original_url = Some(normalize_url(&url));
        }

        let Some(updated) = self.repository.update(code, changes).await? else {
            return Ok(None);
        };

        self.invalidate_cache(code).await;
        debug!(code = %code, "Updated link");
        Ok(Some(updated))
    }

    /// Deletes a link and invalidates its cache entry.
    /// Returns `true` if the link existed.
    pub async fn delete(&self, code: &ShortCode) -> Result<bool> {
        if !self.repository.delete(code).await? {
            return Ok(false);
        }

        self.invalidate_cache(code).await;
        debug!(code = %code, "Deleted link");
        Ok(true)
    }

    /// Records one successful redirect: bumps the access counter and
    /// `last_accessed_at` atomically at the store, then invalidates the
    /// cache entry. A missing code is a silent no-op.
    pub async fn increment_access(&self, code: &ShortCode) -> Result<()> {
        if self
            .repository
            .increment_access(code, Timestamp::now())
            .await?
        {
            self.invalidate_cache(code).await;
        }
        Ok(())
    }

    /// Finds a link by its original URL, optionally restricted to an
    /// owner. Search is not key-addressable, so this always queries the
    /// store.
    pub async fn search_by_original(
        &self,
        original_url: &str,
        owner_id: Option<UserId>,
    ) -> Result<Option<LinkRecord>> {
        let normalized = normalize_url(original_url);
        Ok(self
            .repository
            .get_by_original_url(&normalized, owner_id)
            .await?)
    }

    async fn populate_cache(&self, record: &LinkRecord) {
        if let Err(e) = self
            .cache
            .set(&record.short_code, record, self.cache_ttl)
            .await
        {
            warn!(code = %record.short_code, error = %e, "Failed to populate cache");
        }
    }

    /// Best-effort invalidation: a missed delete leaves a stale entry
    /// whose lifetime is bounded by the cache TTL.
    async fn invalidate_cache(&self, code: &ShortCode) {
        if let Err(e) = self.cache.del(code).await {
            warn!(code = %code, error = %e, "Failed to invalidate cache entry");
        }
    }
}
