//! SQLite persistence for SmartPower local state.

mod errors;
mod kv_store;

pub use errors::StorageError;
pub use kv_store::SqliteKeyValueStore;
