//! Browser `localStorage` implementation for WebAssembly.

use super::{BoxFuture, PreferenceStorage, StorageError, StorageResult};

/// Preferences in `window.localStorage`.
///
/// Note: This is intentionally not Send/Sync since WASM is single-threaded.
#[derive(Default)]
pub struct LocalStorage;

impl LocalStorage {
    pub fn new() -> Self {
        Self
    }

    fn storage() -> StorageResult<web_sys::Storage> {
        let window = web_sys::window()
            .ok_or_else(|| StorageError::Other("No window object".to_string()))?;
        window
            .local_storage()
            .map_err(|e| StorageError::Other(format!("localStorage error: {:?}", e)))?
            .ok_or_else(|| StorageError::Other("localStorage not available".to_string()))
    }
}

impl PreferenceStorage for LocalStorage {
    fn get(&self, key: &str) -> BoxFuture<'_, StorageResult<String>> {
        let key = key.to_string();
        Box::pin(async move {
            Self::storage()?
                .get_item(&key)
                .map_err(|e| StorageError::Io(format!("Failed to read {}: {:?}", key, e)))?
                .ok_or(StorageError::NotFound(key))
        })
    }

    fn set(&self, key: &str, value: &str) -> BoxFuture<'_, StorageResult<()>> {
        let key = key.to_string();
        let value = value.to_string();
        Box::pin(async move {
            Self::storage()?
                .set_item(&key, &value)
                .map_err(|e| StorageError::Io(format!("Failed to write {}: {:?}", key, e)))
        })
    }

    fn remove(&self, key: &str) -> BoxFuture<'_, StorageResult<()>> {
        let key = key.to_string();
        Box::pin(async move {
            Self::storage()?
                .remove_item(&key)
                .map_err(|e| StorageError::Io(format!("Failed to delete {}: {:?}", key, e)))
        })
    }
}
