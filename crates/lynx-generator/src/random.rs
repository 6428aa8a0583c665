use crate::CodeGenerator;
use lynx_core::ShortCode;
use rand::distributions::Alphanumeric;
use rand::Rng;

/// Default length of generated short codes.
pub const DEFAULT_LENGTH: usize = 6;

/// A random short code generator.
///
/// Codes are drawn uniformly from the 62-symbol alphanumeric alphabet
/// (upper and lower case letters plus digits). Six characters give
/// 62^6 (~5.7e10) possible codes, so collisions are rare but possible;
/// the resolver handles them by retrying against the store constraint.
#[derive(Debug, Clone)]
pub struct RandomGenerator {
    length: usize,
}

impl RandomGenerator {
    /// Creates a generator producing codes of the default length (6).
    pub fn new() -> Self {
        Self {
            length: DEFAULT_LENGTH,
        }
    }

    /// Creates a generator producing codes of a custom length.
    pub fn with_length(length: usize) -> Self {
        Self { length }
    }
}

impl Default for RandomGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeGenerator for RandomGenerator {
    fn generate(&self) -> ShortCode {
        let code: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(self.length)
            .map(char::from)
            .collect();
        ShortCode::new_unchecked(code)
    }
}
