//! Link resolution service.
//!
//! This crate provides the [`LinkResolver`], which orchestrates every
//! link operation against the cache and the durable store: cache-aside
//! lookups, conflict-checked creation, partial updates, deletion, and
//! access statistics, all with invalidate-on-write cache discipline.

pub mod error;
pub mod service;

pub use error::{ResolverError, Result};
pub use service::{CreateLink, LinkResolver, DEFAULT_CACHE_TTL};
