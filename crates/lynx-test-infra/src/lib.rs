//! Disposable container fixtures for integration tests.
//!
//! Backends that talk to real MySQL or Redis servers are exercised
//! against throwaway containers started through `testcontainers`.
//! A local Docker daemon is required.

mod error;
pub mod mysql;
pub mod redis;

pub use error::{Result, TestInfraError};
