//! File-based storage implementation for native platforms.

use super::{BoxFuture, PreferenceStorage, StorageError, StorageResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Stores each key as a small file in a directory.
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a storage rooted at `base_path`, creating the directory if needed.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                StorageError::Io(format!("Failed to create storage directory: {}", e))
            })?;
        }
        Ok(Self { base_path })
    }

    /// Storage in the platform config directory.
    ///
    /// On Linux: `~/.config/thumbboard/`
    /// On macOS: `~/Library/Application Support/thumbboard/`
    /// On Windows: `%APPDATA%\thumbboard\`
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::config_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;
        Self::new(base.join("thumbboard"))
    }

    fn key_path(&self, key: &str) -> PathBuf {
        let safe_key: String = key
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.base_path.join(format!("{}.json", safe_key))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

impl PreferenceStorage for FileStorage {
    fn get(&self, key: &str) -> BoxFuture<'_, StorageResult<String>> {
        let path = self.key_path(key);
        let key = key.to_string();
        Box::pin(async move {
            if !path.exists() {
                return Err(StorageError::NotFound(key));
            }
            fs::read_to_string(&path).map_err(|e| {
                StorageError::Io(format!("Failed to read {}: {}", path.display(), e))
            })
        })
    }

    fn set(&self, key: &str, value: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.key_path(key);
        let value = value.to_string();
        Box::pin(async move {
            fs::write(&path, value).map_err(|e| {
                StorageError::Io(format!("Failed to write {}: {}", path.display(), e))
            })
        })
    }

    fn remove(&self, key: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.key_path(key);
        Box::pin(async move {
            if path.exists() {
                fs::remove_file(&path).map_err(|e| {
                    StorageError::Io(format!("Failed to delete {}: {}", path.display(), e))
                })?;
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Preferences, block_on, load_preferences, save_preferences};
    use tempfile::tempdir;

    #[test]
    fn test_preferences_survive_new_instance() {
        let dir = tempdir().unwrap();
        let prefs = Preferences {
            sidebar_open: false,
            sidebar_width: 280.0,
        };
        {
            let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
            block_on(save_preferences(&storage, &prefs)).unwrap();
        }
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
        assert_eq!(block_on(load_preferences(&storage)), prefs);
    }

    #[test]
    fn test_not_found_and_remove() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
        assert!(matches!(
            block_on(storage.get("missing")),
            Err(StorageError::NotFound(_))
        ));
        block_on(storage.set("k", "1")).unwrap();
        block_on(storage.remove("k")).unwrap();
        assert!(block_on(storage.get("k")).is_err());
    }

    #[test]
    fn test_sanitizes_key() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested")).unwrap();
        block_on(storage.set("a/b:c", "v")).unwrap();
        assert_eq!(block_on(storage.get("a/b:c")).unwrap(), "v");
        assert!(storage.base_path().join("a_b_c.json").exists());
    }
}
