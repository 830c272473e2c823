//! Short identifier generation.
//!
//! Generators never touch storage; backends call them when a URL has not
//! been seen before. Collisions are not retried, so a generator has to make
//! them negligible on its own.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};

/// Default length of generated identifiers.
pub const DEFAULT_ID_LENGTH: usize = 10;

/// Produces opaque short identifiers.
pub trait ShortIdGenerator: Debug + Send + Sync + 'static {
    /// Generate a new identifier.
    fn generate(&self) -> String;
}

/// Random URL-safe identifiers backed by `nanoid`.
#[derive(Debug, Clone, Copy)]
pub struct NanoIdGenerator {
    length: usize,
}

impl NanoIdGenerator {
    /// Create a generator producing identifiers of `length` characters.
    #[must_use]
    pub const fn new(length: usize) -> Self {
        Self { length }
    }
}

impl Default for NanoIdGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_ID_LENGTH)
    }
}

impl ShortIdGenerator for NanoIdGenerator {
    fn generate(&self) -> String {
        let length = self.length;
        nanoid::nanoid!(length)
    }
}

/// Sequential identifiers like `"seq000000"`, `"seq000001"`.
///
/// Unique within one instance; mostly useful where tests need to know the
/// next identifier in advance.
#[derive(Debug)]
pub struct SequenceGenerator {
    counter: AtomicU64,
    prefix: String,
}

impl SequenceGenerator {
    /// Create a generator counting from zero.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            counter: AtomicU64::new(0),
            prefix: prefix.into(),
        }
    }
}

impl ShortIdGenerator for SequenceGenerator {
    fn generate(&self) -> String {
        let count = self.counter.fetch_add(1, Ordering::SeqCst);
        format!("{}{count:06}", self.prefix)
    }
}
