use async_trait::async_trait;
use jiff::Timestamp;
use lynx_core::repository::Result;
use lynx_core::{LinkChanges, LinkRecord, LinkRepository, NewLink, ShortCode, StorageError, UserId};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

/// MySQL implementation of [`LinkRepository`]: the source of truth.
///
/// Expected schema (`links` table): `id BIGINT AUTO_INCREMENT PRIMARY KEY`,
/// `original_url TEXT`, `short_code VARCHAR(32) UNIQUE`,
/// `custom_alias VARCHAR(32) NULL`, `created_at BIGINT`,
/// `expires_at BIGINT NULL`, `last_accessed_at BIGINT NULL`,
/// `access_count BIGINT`, `owner_id BIGINT NULL`. Timestamps are stored
/// as unix seconds.
///
/// The unique constraint on `short_code` is the serialization point for
/// racing creations, and the access counter is incremented in a single
/// UPDATE statement so concurrent redirects never lose counts.
#[derive(Debug, Clone)]
pub struct MySqlRepository {
    pool: MySqlPool,
}

impl MySqlRepository {
    /// Creates a repository from an existing MySQL connection pool.
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Creates a repository by opening a new MySQL connection pool.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = MySqlPool::connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

fn parse_required_timestamp(field: &str, seconds: i64) -> Result<Timestamp> {
    Timestamp::from_second(seconds).map_err(|e| {
        StorageError::InvalidData(format!("invalid {field} timestamp '{seconds}': {e}"))
    })
}

fn parse_timestamp(field: &str, seconds: Option<i64>) -> Result<Option<Timestamp>> {
    seconds
        .map(|value| parse_required_timestamp(field, value))
        .transpose()
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

const SELECT_COLUMNS: &str = "id, original_url, short_code, custom_alias, \
     created_at, expires_at, last_accessed_at, access_count, owner_id";

fn row_to_record(row: &MySqlRow) -> Result<LinkRecord> {
    let id: i64 = row.try_get("id").map_err(map_sqlx_error)?;
    let original_url: String = row.try_get("original_url").map_err(map_sqlx_error)?;
    let short_code: String = row.try_get("short_code").map_err(map_sqlx_error)?;
    let custom_alias: Option<String> = row.try_get("custom_alias").map_err(map_sqlx_error)?;
    let created_at_raw: i64 = row.try_get("created_at").map_err(map_sqlx_error)?;
    let expires_at_raw: Option<i64> = row.try_get("expires_at").map_err(map_sqlx_error)?;
    let accessed_at_raw: Option<i64> = row.try_get("last_accessed_at").map_err(map_sqlx_error)?;
    let access_count: i64 = row.try_get("access_count").map_err(map_sqlx_error)?;
    let owner_id: Option<i64> = row.try_get("owner_id").map_err(map_sqlx_error)?;

    let created_at = parse_required_timestamp("created_at", created_at_raw)?;

    Ok(LinkRecord {
        id,
        original_url,
        short_code: ShortCode::new_unchecked(short_code),
        custom_alias,
        created_at,
        expires_at: parse_timestamp("expires_at", expires_at_raw)?,
        last_accessed_at: parse_timestamp("last_accessed_at", accessed_at_raw)?,
        access_count: u64::try_from(access_count).map_err(|_| {
            StorageError::InvalidData(format!("negative access_count '{access_count}'"))
        })?,
        owner_id: owner_id.map(UserId::new),
    })
}

#[async_trait]
impl LinkRepository for MySqlRepository {
    async fn insert(&self, link: NewLink) -> Result<LinkRecord> {
        let created_at = Timestamp::now();
        let expires_at = link.expires_at.map(|ts| ts.as_second());

        let result = sqlx::query(
            r#"
            INSERT INTO links
                (original_url, short_code, custom_alias, created_at,
                 expires_at, last_accessed_at, access_count, owner_id)
            VALUES (?, ?, ?, ?, ?, NULL, 0, ?)
            "#,
        )
        .bind(&link.original_url)
        .bind(link.short_code.as_str())
        .bind(&link.custom_alias)
        .bind(created_at.as_second())
        .bind(expires_at)
        .bind(link.owner_id.map(|owner| owner.as_i64()))
        .execute(&self.pool)
        .await;

        let result = match result {
            Ok(result) => result,
            Err(err) if is_unique_violation(&err) => {
                return Err(StorageError::Conflict(link.short_code.to_string()))
            }
            Err(err) => return Err(map_sqlx_error(err)),
        };

        // Seconds precision in the database; keep the returned record
        // consistent with what a re-read would produce.
        let created_at = parse_required_timestamp("created_at", created_at.as_second())?;

        Ok(LinkRecord {
            id: i64::try_from(result.last_insert_id())
                .map_err(|e| StorageError::InvalidData(format!("invalid insert id: {e}")))?,
            original_url: link.original_url,
            short_code: link.short_code,
            custom_alias: link.custom_alias,
            created_at,
            expires_at: parse_timestamp("expires_at", expires_at)?,
            last_accessed_at: None,
            access_count: 0,
            owner_id: link.owner_id,
        })
    }

    async fn get_by_short_code(&self, code: &ShortCode) -> Result<Option<LinkRecord>> {
        // No expiry filter: expired links stay visible to lookups and
        // stats, and are only classified at redirect time.
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM links WHERE short_code = ? LIMIT 1"
        ))
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref().map(row_to_record).transpose()
    }

    async fn get_by_original_url(
        &self,
        original_url: &str,
        owner_id: Option<UserId>,
    ) -> Result<Option<LinkRecord>> {
        let row = match owner_id {
            Some(owner) => {
                sqlx::query(&format!(
                    "SELECT {SELECT_COLUMNS} FROM links \
                     WHERE original_url = ? AND owner_id = ? LIMIT 1"
                ))
                .bind(original_url)
                .bind(owner.as_i64())
                .fetch_optional(&self.pool)
                .await
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {SELECT_COLUMNS} FROM links WHERE original_url = ? LIMIT 1"
                ))
                .bind(original_url)
                .fetch_optional(&self.pool)
                .await
            }
        }
        .map_err(map_sqlx_error)?;

        row.as_ref().map(row_to_record).transpose()
    }

    async fn update(&self, code: &ShortCode, changes: LinkChanges) -> Result<Option<LinkRecord>> {
        // Read and write in one transaction, with the row locked in
        // between. Concurrent partial updates serialize on the lock, so
        // neither overwrites the other's fields with a stale pre-image,
        // and a concurrent delete cannot slip in before the write.
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM links WHERE short_code = ? FOR UPDATE"
        ))
        .bind(code.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        let Some(mut record) = row.as_ref().map(row_to_record).transpose()? else {
            return Ok(None);
        };

        if let Some(url) = changes.original_url {
            record.original_url = url;
        }
        if let Some(expires_at) = changes.expires_at {
            record.expires_at = expires_at;
        }

        let expires_at = record.expires_at.map(|ts| ts.as_second());

        sqlx::query(
            r#"
            UPDATE links
            SET original_url = ?, expires_at = ?
            WHERE short_code = ?
            "#,
        )
        .bind(&record.original_url)
        .bind(expires_at)
        .bind(code.as_str())
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;

        // Seconds precision in the database; keep the returned record
        // consistent with what a re-read would produce.
        record.expires_at = parse_timestamp("expires_at", expires_at)?;

        Ok(Some(record))
    }

    async fn delete(&self, code: &ShortCode) -> Result<bool> {
        let result = sqlx::query("DELETE FROM links WHERE short_code = ?")
            .bind(code.as_str())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn exists(&self, code: &ShortCode) -> Result<bool> {
        let exists = sqlx::query("SELECT 1 FROM links WHERE short_code = ? LIMIT 1")
            .bind(code.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?
            .is_some();

        Ok(exists)
    }

    async fn increment_access(&self, code: &ShortCode, now: Timestamp) -> Result<bool> {
        // Single-statement increment: the row lock serializes concurrent
        // redirects, so no update is ever lost.
        let result = sqlx::query(
            r#"
            UPDATE links
            SET access_count = access_count + 1, last_accessed_at = ?
            WHERE short_code = ?
            "#,
        )
        .bind(now.as_second())
        .bind(code.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }
}
