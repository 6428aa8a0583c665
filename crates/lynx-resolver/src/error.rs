use lynx_core::{CoreError, StorageError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ResolverError>;

/// Errors surfaced by resolver operations.
///
/// The resolver does not map these to transport status codes; the
/// variants are distinguishable enough for the HTTP boundary to do so
/// (conflict, missing, expired, dependency failure).
#[derive(Debug, Clone, Error)]
pub enum ResolverError {
    #[error("alias already exists: {0}")]
    AliasConflict(String),
    #[error("no link exists for short code: {0}")]
    NotFound(String),
    #[error("link has expired: {0}")]
    Expired(String),
    #[error("invalid short code: {0}")]
    InvalidShortCode(String),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<CoreError> for ResolverError {
    fn from(value: CoreError) -> Self {
        match value {
            CoreError::InvalidShortCode(message) => Self::InvalidShortCode(message),
        }
    }
}
