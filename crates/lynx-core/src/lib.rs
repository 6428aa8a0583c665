//! Core types and traits for the Lynx URL shortener.
//!
//! This crate provides the shared domain model and the trait seams
//! (repository, cache, identity) implemented by the other service crates.

pub mod cache;
pub mod error;
pub mod identity;
pub mod link;
pub mod repository;
pub mod shortcode;

pub use cache::{CacheResult, LinkCache};
pub use error::{CacheError, CoreError, IdentityError, StorageError};
pub use identity::{Credentials, IdentityProvider, Token, UserId};
pub use link::{normalize_url, LinkChanges, LinkRecord, NewLink};
pub use repository::LinkRepository;
pub use shortcode::ShortCode;
