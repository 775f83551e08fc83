//! Storage abstraction for UI preferences.
//!
//! Only UI chrome preferences are persisted. Board content is not saved
//! automatically; see `CanvasContent::to_json` for explicit export.

mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod file;

#[cfg(target_arch = "wasm32")]
mod local;

pub use memory::MemoryStorage;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStorage;

#[cfg(target_arch = "wasm32")]
pub use local::LocalStorage;

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Key under which [`Preferences`] are stored.
pub const PREFERENCES_KEY: &str = "thumbboard.preferences";

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Key not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async operations (compatible with WASM).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Persisted UI chrome preferences.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub sidebar_open: bool,
    /// Sidebar width in screen pixels.
    pub sidebar_width: f64,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            sidebar_open: true,
            sidebar_width: 320.0,
        }
    }
}

impl Preferences {
    pub const MIN_SIDEBAR_WIDTH: f64 = 200.0;
    pub const MAX_SIDEBAR_WIDTH: f64 = 640.0;

    pub fn clamp_width(width: f64) -> f64 {
        width.clamp(Self::MIN_SIDEBAR_WIDTH, Self::MAX_SIDEBAR_WIDTH)
    }
}

/// String key-value store for preferences.
///
/// Note: On native platforms, implementations must be Send + Sync.
/// On WASM, these bounds are relaxed since it's single-threaded.
#[cfg(not(target_arch = "wasm32"))]
pub trait PreferenceStorage: Send + Sync {
    fn get(&self, key: &str) -> BoxFuture<'_, StorageResult<String>>;
    fn set(&self, key: &str, value: &str) -> BoxFuture<'_, StorageResult<()>>;
    fn remove(&self, key: &str) -> BoxFuture<'_, StorageResult<()>>;
}

/// String key-value store for preferences (WASM version without Send + Sync).
#[cfg(target_arch = "wasm32")]
pub trait PreferenceStorage {
    fn get(&self, key: &str) -> BoxFuture<'_, StorageResult<String>>;
    fn set(&self, key: &str, value: &str) -> BoxFuture<'_, StorageResult<()>>;
    fn remove(&self, key: &str) -> BoxFuture<'_, StorageResult<()>>;
}

/// Load preferences, falling back to defaults when none are stored or the
/// stored value is unreadable.
pub async fn load_preferences<S: PreferenceStorage + ?Sized>(storage: &S) -> Preferences {
    match storage.get(PREFERENCES_KEY).await {
        Ok(json) => match serde_json::from_str::<Preferences>(&json) {
            Ok(prefs) => prefs,
            Err(e) => {
                log::warn!("Ignoring unreadable preferences: {}", e);
                Preferences::default()
            }
        },
        Err(StorageError::NotFound(_)) => Preferences::default(),
        Err(e) => {
            log::warn!("Failed to load preferences: {}", e);
            Preferences::default()
        }
    }
}

pub async fn save_preferences<S: PreferenceStorage + ?Sized>(
    storage: &S,
    preferences: &Preferences,
) -> StorageResult<()> {
    let json = serde_json::to_string(preferences)
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    storage.set(PREFERENCES_KEY, &json).await
}

/// Simple blocking executor for tests.
#[cfg(test)]
pub(crate) fn block_on<F: std::future::Future>(f: F) -> F::Output {
    use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

    fn dummy_raw_waker() -> RawWaker {
        fn no_op(_: *const ()) {}
        fn clone(_: *const ()) -> RawWaker {
            dummy_raw_waker()
        }
        static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);
        RawWaker::new(std::ptr::null(), &VTABLE)
    }

    let waker = unsafe { Waker::from_raw(dummy_raw_waker()) };
    let mut cx = Context::from_waker(&waker);
    let mut f = std::pin::pin!(f);

    loop {
        if let Poll::Ready(result) = f.as_mut().poll(&mut cx) {
            return result;
        }
    }
}
