//! Imported video thumbnails.

use super::ThumbnailId;
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};

/// Width of a thumbnail card in world units.
pub const THUMBNAIL_WIDTH: f64 = 320.0;
/// Height of the image part of a thumbnail card in world units.
pub const THUMBNAIL_HEIGHT: f64 = 180.0;
/// Height of the title/metrics strip under the image.
pub const CAPTION_HEIGHT: f64 = 60.0;

/// Video platform a thumbnail was imported from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    YouTube,
    TikTok,
}

/// Engagement numbers reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VideoMetrics {
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    pub published_days_ago: u32,
}

impl VideoMetrics {
    /// Likes and comments per view (0 when there are no views).
    pub fn engagement_rate(&self) -> f64 {
        if self.view_count == 0 {
            return 0.0;
        }
        (self.like_count + self.comment_count) as f64 / self.view_count as f64
    }

    /// Average views per day since publication.
    pub fn views_per_day(&self) -> f64 {
        self.view_count as f64 / f64::from(self.published_days_ago.max(1))
    }
}

/// A video thumbnail placed on the canvas.
///
/// The live position lives in `CanvasContent::positions`; `default_position`
/// is the grid slot assigned at import time and is used when no explicit
/// position has been recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thumbnail {
    pub id: ThumbnailId,
    pub title: String,
    pub channel_name: String,
    pub thumbnail_url: String,
    /// Video length in seconds, if the platform reported it.
    #[serde(default)]
    pub duration_secs: Option<u32>,
    #[serde(default)]
    pub metrics: VideoMetrics,
    #[serde(default)]
    pub platform: Platform,
    pub default_position: Point,
}

impl Thumbnail {
    /// World-space size of a thumbnail card (image + caption).
    pub fn size() -> Size {
        Size::new(THUMBNAIL_WIDTH, THUMBNAIL_HEIGHT + CAPTION_HEIGHT)
    }

    /// Card bounds when the top-left corner sits at `position`.
    pub fn bounds_at(position: Point) -> Rect {
        Rect::from_origin_size(position, Self::size())
    }

    /// Duration formatted as `m:ss` or `h:mm:ss`.
    pub fn duration_label(&self) -> Option<String> {
        self.duration_secs.map(|secs| {
            let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
            if h > 0 {
                format!("{}:{:02}:{:02}", h, m, s)
            } else {
                format!("{}:{:02}", m, s)
            }
        })
    }
}
