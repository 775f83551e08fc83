//! Video import boundary.
//!
//! Platform plugins fetch video records; [`GridLayout`] turns them into
//! thumbnails with a default grid slot.

use crate::config::GridConfig;
use crate::model::{Platform, Thumbnail, VideoMetrics};
use crate::storage::BoxFuture;
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Invalid import query: {0}")]
    InvalidQuery(String),
    #[error("Malformed import response: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Import source failed: {0}")]
    Source(String),
}

/// One video as reported by an import source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub channel_name: String,
    #[serde(default)]
    pub thumbnail_url: String,
    #[serde(default)]
    pub duration_secs: Option<u32>,
    #[serde(default)]
    pub view_count: u64,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub comment_count: u64,
    #[serde(default)]
    pub published_days_ago: u32,
    #[serde(default)]
    pub platform: Platform,
}

impl VideoRecord {
    fn metrics(&self) -> VideoMetrics {
        VideoMetrics {
            view_count: self.view_count,
            like_count: self.like_count,
            comment_count: self.comment_count,
            published_days_ago: self.published_days_ago,
        }
    }

    /// Build a thumbnail placed at `position`.
    pub fn into_thumbnail(self, position: Point) -> Thumbnail {
        let metrics = self.metrics();
        Thumbnail {
            id: self.id,
            title: self.title,
            channel_name: self.channel_name,
            thumbnail_url: self.thumbnail_url,
            duration_secs: self.duration_secs,
            metrics,
            platform: self.platform,
            default_position: position,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelInfo {
    pub name: String,
    #[serde(default)]
    pub subscriber_count: Option<u64>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub videos: Vec<VideoRecord>,
    #[serde(default)]
    pub channel_info: Option<ChannelInfo>,
}

pub fn parse_import_response(json: &str) -> Result<ImportResult, ImportError> {
    Ok(serde_json::from_str(json)?)
}

/// A source of videos (channel URL, search, playlist...).
///
/// Note: On native platforms, implementations must be Send + Sync.
#[cfg(not(target_arch = "wasm32"))]
pub trait ImportSource: Send + Sync {
    fn import(&self, query: &str) -> BoxFuture<'_, Result<ImportResult, ImportError>>;
}

/// A source of videos (WASM version without Send + Sync).
#[cfg(target_arch = "wasm32")]
pub trait ImportSource {
    fn import(&self, query: &str) -> BoxFuture<'_, Result<ImportResult, ImportError>>;
}

/// Import source that answers every query with a fixed result.
#[derive(Debug, Clone, Default)]
pub struct StaticImportSource {
    result: ImportResult,
}

impl StaticImportSource {
    pub fn new(result: ImportResult) -> Self {
        Self { result }
    }
}

impl ImportSource for StaticImportSource {
    fn import(&self, query: &str) -> BoxFuture<'_, Result<ImportResult, ImportError>> {
        let outcome = if query.trim().is_empty() {
            Err(ImportError::InvalidQuery("empty query".to_string()))
        } else {
            Ok(self.result.clone())
        };
        Box::pin(async move { outcome })
    }
}

/// Row-major grid of default thumbnail slots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub origin: Point,
    pub columns: usize,
    pub step: Vec2,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self::from(GridConfig::default())
    }
}

impl From<GridConfig> for GridLayout {
    fn from(config: GridConfig) -> Self {
        Self {
            origin: config.origin,
            columns: config.columns.max(1),
            step: config.step,
        }
    }
}

impl GridLayout {
    /// Top-left corner of the slot at `index`.
    pub fn position(&self, index: usize) -> Point {
        let columns = self.columns.max(1);
        let col = (index % columns) as f64;
        let row = (index / columns) as f64;
        self.origin + Vec2::new(col * self.step.x, row * self.step.y)
    }

    /// Place `videos` into consecutive slots starting at `first_slot`.
    pub fn place(&self, videos: Vec<VideoRecord>, first_slot: usize) -> Vec<Thumbnail> {
        videos
            .into_iter()
            .enumerate()
            .map(|(i, video)| video.into_thumbnail(self.position(first_slot + i)))
            .collect()
    }
}
