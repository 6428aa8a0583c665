use crate::error::IdentityError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Identifier of a registered user, referenced by link ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An opaque bearer token issued to an authenticated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Login credentials presented by a user.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// The external identity collaborator.
///
/// The resolver never checks ownership itself; the request-handling
/// boundary resolves the acting user through this contract and passes
/// the resulting [`UserId`] down.
#[async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    /// Verifies credentials and returns the user's identity.
    async fn authenticate(&self, credentials: &Credentials) -> Result<UserId, IdentityError>;

    /// Issues a token for an authenticated user.
    async fn issue_token(&self, user: UserId) -> Result<Token, IdentityError>;

    /// Resolves a token back to the user it was issued for.
    async fn verify_token(&self, token: &Token) -> Result<UserId, IdentityError>;
}
