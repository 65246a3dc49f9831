//! Key-value persistence contract for local state.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::errors::{Error, Result};

/// Durable string key-value storage. Values have no expiry and are
/// overwritten in place.
pub trait KeyValueStore: Send + Sync {
    fn get_value(&self, key: &str) -> Result<Option<String>>;

    fn set_value(&self, key: &str, value: &str) -> Result<()>;

    fn delete_value(&self, key: &str) -> Result<()>;
}

/// Process-local store, used when no durable backend is configured and in tests.
#[derive(Debug, Default)]
pub struct InMemoryKeyValueStore {
    values: RwLock<HashMap<String, String>>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn get_value(&self, key: &str) -> Result<Option<String>> {
        let values = self
            .values
            .read()
            .map_err(|_| Error::storage("in-memory store poisoned"))?;
        Ok(values.get(key).cloned())
    }

    fn set_value(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self
            .values
            .write()
            .map_err(|_| Error::storage("in-memory store poisoned"))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete_value(&self, key: &str) -> Result<()> {
        let mut values = self
            .values
            .write()
            .map_err(|_| Error::storage("in-memory store poisoned"))?;
        values.remove(key);
        Ok(())
    }
}
