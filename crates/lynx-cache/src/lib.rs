//! Cache implementations for link records.
//!
//! The [`LinkCache`] trait itself lives in `lynx_core`; this crate
//! provides the Redis-backed implementation used in production and a
//! Moka-backed in-memory implementation for single-node deployments
//! and tests.

pub mod moka;
pub mod redis;

pub use self::moka::MokaLinkCache;
pub use self::redis::RedisLinkCache;
pub use lynx_core::{CacheResult, LinkCache};
