//! Storage layer module.
//!
//! This module provides trait-based storage abstraction allowing the memory,
//! file and database backends to be swapped without changing business logic.

pub mod factory;
pub mod file;
pub mod memory;
pub mod postgres;
pub mod traits;

pub use factory::create_storage;
pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use postgres::PostgresStorage;
pub use traits::{DynStorage, LinkStorage, Storage};
