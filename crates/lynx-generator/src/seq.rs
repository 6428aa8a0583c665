use crate::CodeGenerator;
use lynx_core::ShortCode;
use std::sync::atomic::{AtomicU64, Ordering};

/// A deterministic short code generator using a sequential counter.
///
/// Produces codes like "lx000000", "lx000001", etc. Mainly useful in
/// tests, where predictable codes make assertions simple, and as a
/// collision-free generator within a single process.
#[derive(Debug)]
pub struct SequentialGenerator {
    counter: AtomicU64,
    prefix: String,
}

impl SequentialGenerator {
    /// Creates a new sequential generator with the given prefix.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            counter: AtomicU64::new(0),
            prefix: prefix.into(),
        }
    }

    /// Creates a sequential generator starting from a specific offset.
    pub fn with_offset(prefix: impl Into<String>, offset: u64) -> Self {
        Self {
            counter: AtomicU64::new(offset),
            prefix: prefix.into(),
        }
    }
}

impl CodeGenerator for SequentialGenerator {
    fn generate(&self) -> ShortCode {
        let count = self.counter.fetch_add(1, Ordering::SeqCst);
        ShortCode::new_unchecked(format!("{}{:06}", self.prefix, count))
    }
}
