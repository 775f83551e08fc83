//! In-memory storage implementation.

use super::{BoxFuture, PreferenceStorage, StorageError, StorageResult};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory storage for testing and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStorage {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStorage for MemoryStorage {
    fn get(&self, key: &str) -> BoxFuture<'_, StorageResult<String>> {
        let key = key.to_string();
        Box::pin(async move {
            let values = self
                .values
                .read()
                .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
            values.get(&key).cloned().ok_or(StorageError::NotFound(key))
        })
    }

    fn set(&self, key: &str, value: &str) -> BoxFuture<'_, StorageResult<()>> {
        let key = key.to_string();
        let value = value.to_string();
        Box::pin(async move {
            let mut values = self
                .values
                .write()
                .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
            values.insert(key, value);
            Ok(())
        })
    }

    fn remove(&self, key: &str) -> BoxFuture<'_, StorageResult<()>> {
        let key = key.to_string();
        Box::pin(async move {
            let mut values = self
                .values
                .write()
                .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
            values.remove(&key);
            Ok(())
        })
    }
}
