//! Storage backends for account records and encrypted entries
//!
//! This module provides two storage backends:
//! 1. In-memory (tests and embedding)
//! 2. JSON file in the user's data directory

mod file;
mod memory;
mod traits;
mod types;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use traits::EntryStore;
pub use types::{Account, StoredEntry};
