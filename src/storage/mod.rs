//! Sensorboard Persistence Layer
//!
//! A durable, synchronous, string-keyed blob store. Values are opaque strings
//! (JSON documents in practice) and every `set` replaces the previous value.
//!
//! - **file**: one file per key inside a data directory, atomic replace
//! - **memory**: volatile map, for tests and ephemeral runs
//! - **error**: Error types
//!
//! # Example
//!
//! ```rust,no_run
//! use sensorboard::storage::{FileStore, KeyValueStore};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = FileStore::open("./sensorboard_data")?;
//!     store.set("sensors", "{}")?;
//!     assert_eq!(store.get("sensors")?.as_deref(), Some("{}"));
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod file;
pub mod memory;

pub use error::{StorageError, StorageResult};
pub use file::FileStore;
pub use memory::MemoryStore;

/// Synchronous string-keyed blob storage
///
/// Implementations must be shareable across tasks; callers hold them as
/// `Arc<dyn KeyValueStore>`.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, `None` if absent
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Store `value` under `key`, overwriting any previous value
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Delete `key`; deleting a missing key succeeds
    fn remove(&self, key: &str) -> StorageResult<()>;
}
