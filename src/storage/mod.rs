//! Durable key-value backends for the session store.
//!
//! Values are JSON documents addressed by a flat string key. Namespacing is
//! applied by the caller; backends store keys verbatim.

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use serde_json::Value;

use crate::errors::StoreResult;

pub trait KeyValueStore: Send + Sync {
    /// Returns `Ok(None)` when the key was never written or has been removed.
    fn get(&self, key: &str) -> StoreResult<Option<Value>>;

    fn set(&self, key: &str, value: Value) -> StoreResult<()>;

    fn remove(&self, key: &str) -> StoreResult<()>;

    /// Pushes buffered state to the medium. Backends that write through can keep the default.
    fn flush(&self) -> StoreResult<()> {
        Ok(())
    }
}
