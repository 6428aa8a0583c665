//! Short code generators for the Lynx URL shortener.

pub mod random;
pub mod seq;

pub use random::RandomGenerator;
pub use seq::SequentialGenerator;

use lynx_core::ShortCode;

/// Trait for generating short codes.
///
/// Implementations are pure generators that don't interact with storage.
/// Generated codes are not guaranteed unique by themselves; uniqueness
/// is enforced by the store's constraint, with the resolver retrying on
/// conflict.
pub trait CodeGenerator: Send + Sync + 'static {
    /// Generates a new short code.
    fn generate(&self) -> ShortCode;
}
