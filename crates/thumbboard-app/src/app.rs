//! Headless session player.

use crate::script::{ReplayStats, Script, ScriptError};
use kurbo::Size;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use thumbboard_core::time::{Duration, Instant};
use thumbboard_scene::{CanvasSession, RecordingBackend, SceneError, SceneLayer};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Script(#[from] ScriptError),
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),
    #[error("Export failed: {0}")]
    Export(#[from] serde_json::Error),
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Command line for the native player.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "native", derive(clap::Parser))]
#[cfg_attr(
    feature = "native",
    command(
        name = "thumbboard",
        about = "Replay a recorded ThumbBoard session without a window"
    )
)]
pub struct AppConfig {
    /// Session script (JSON).
    pub script: PathBuf,

    /// Write the final board content here as JSON.
    #[cfg_attr(feature = "native", arg(short, long, value_name = "FILE"))]
    pub export: Option<PathBuf>,

    /// Screen width when the script does not set one.
    #[cfg_attr(feature = "native", arg(long, default_value_t = 1280.0))]
    pub width: f64,

    /// Screen height when the script does not set one.
    #[cfg_attr(feature = "native", arg(long, default_value_t = 800.0))]
    pub height: f64,

    /// Load and save UI preferences in this directory.
    #[cfg_attr(feature = "native", arg(long, value_name = "DIR"))]
    pub prefs_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            script: PathBuf::new(),
            export: None,
            width: 1280.0,
            height: 800.0,
            prefs_dir: None,
        }
    }
}

/// What the board looks like after a replay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardSummary {
    pub thumbnails: usize,
    pub locked: usize,
    pub drawings: usize,
    pub labels: usize,
    pub comments: usize,
    pub selected: usize,
    pub undo_depth: usize,
    pub redo_depth: usize,
    /// Action the next undo would revert.
    pub next_undo: Option<&'static str>,
    pub next_redo: Option<&'static str>,
    pub scale: f64,
    pub scene_nodes: usize,
    pub overlay_nodes: usize,
    pub stats: ReplayStats,
}

impl BoardSummary {
    pub fn of(session: &CanvasSession<RecordingBackend>, stats: ReplayStats) -> Self {
        let state = session.state();
        Self {
            thumbnails: state.canvas.thumbnails.len(),
            locked: state.canvas.locked.len(),
            drawings: state.canvas.drawings.len(),
            labels: state.canvas.labels.len(),
            comments: state.canvas.comments.len(),
            selected: state.selection.thumbnails.len() + state.selection.labels.len(),
            undo_depth: state.history.past_len(),
            redo_depth: state.history.future_len(),
            next_undo: state.history.undo_label(),
            next_redo: state.history.redo_label(),
            scale: state.ui.viewport.scale,
            scene_nodes: session.backend().len(),
            overlay_nodes: session.backend().count_in_layer(SceneLayer::Overlay),
            stats,
        }
    }
}

impl fmt::Display for BoardSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} thumbnails ({} locked), {} drawings, {} labels, {} comments",
            self.thumbnails, self.locked, self.drawings, self.labels, self.comments
        )?;
        writeln!(f, "{} selected, zoom {:.0}%", self.selected, self.scale * 100.0)?;
        write!(f, "history: {} undo", self.undo_depth)?;
        if let Some(action) = self.next_undo {
            write!(f, " (next {})", action)?;
        }
        write!(f, " / {} redo", self.redo_depth)?;
        if let Some(action) = self.next_redo {
            write!(f, " (next {})", action)?;
        }
        writeln!(f)?;
        write!(
            f,
            "scene: {} nodes ({} overlay) after {} steps, {} frames",
            self.scene_nodes, self.overlay_nodes, self.stats.steps, self.stats.frames
        )
    }
}

pub struct App;

impl App {
    /// Replay `script` on a fresh session and bring the scene up to date.
    pub fn replay(
        script: &Script,
        screen: Size,
        base_dir: &Path,
    ) -> Result<(CanvasSession<RecordingBackend>, BoardSummary), AppError> {
        let screen = script.screen.unwrap_or(screen);
        let mut session = CanvasSession::new(script.config.clone(), RecordingBackend::new(), screen);
        let start = Instant::now();
        let stats = script.replay(&mut session, base_dir, start)?;
        session.frame(start + Duration::from_millis(stats.elapsed_ms))?;
        let summary = BoardSummary::of(&session, stats);
        Ok((session, summary))
    }

    /// Run the player described by `config`.
    #[cfg(feature = "native")]
    pub fn run(config: &AppConfig) -> Result<BoardSummary, AppError> {
        use thumbboard_core::storage::{FileStorage, MemoryStorage, PreferenceStorage};

        let script = Script::load(&config.script)?;
        let base_dir = config.script.parent().unwrap_or_else(|| Path::new("."));
        let screen = script.screen.unwrap_or(Size::new(config.width, config.height));
        let mut session =
            CanvasSession::new(script.config.clone(), RecordingBackend::new(), screen);

        let storage: Box<dyn PreferenceStorage> = match &config.prefs_dir {
            Some(dir) => match FileStorage::new(dir.clone()) {
                Ok(storage) => Box::new(storage),
                Err(e) => {
                    log::warn!("Preferences unavailable: {}", e);
                    Box::new(MemoryStorage::new())
                }
            },
            None => Box::new(MemoryStorage::new()),
        };
        pollster::block_on(session.load_preferences(storage.as_ref()));

        let start = Instant::now();
        let stats = script.replay(&mut session, base_dir, start)?;
        session.frame(start + Duration::from_millis(stats.elapsed_ms))?;

        if let Err(e) = pollster::block_on(session.save_preferences(storage.as_ref())) {
            log::warn!("Failed to save preferences: {}", e);
        }
        if let Some(path) = &config.export {
            let json = session.state().canvas.to_json()?;
            std::fs::write(path, json).map_err(|source| AppError::Io {
                path: path.clone(),
                source,
            })?;
            log::info!("Exported board to {}", path.display());
        }
        Ok(BoardSummary::of(&session, stats))
    }
}
