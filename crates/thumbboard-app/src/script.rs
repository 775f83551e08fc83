//! Recorded canvas sessions.
//!
//! A script is a JSON document listing input steps. Each step may wait a
//! number of milliseconds on a virtual clock first, so double clicks and
//! resize debouncing replay deterministically.

use kurbo::Size;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use thumbboard_core::config::CanvasConfig;
use thumbboard_core::import::{ImportError, ImportResult, parse_import_response};
use thumbboard_core::input::{KeyEvent, Modifiers, PointerEvent};
use thumbboard_core::model::LabelStylePatch;
use thumbboard_core::presence::{PresenceError, UserInfo};
use thumbboard_core::state::Action;
use thumbboard_core::time::{Duration, Instant};
use thumbboard_scene::{CanvasSession, SceneBackend, SceneError};

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid script: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Step {step}: {source}")]
    Import { step: usize, source: ImportError },
    #[error("Step {step}: {source}")]
    Presence { step: usize, source: PresenceError },
    #[error("Step {step}: {source}")]
    Scene { step: usize, source: SceneError },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    Pointer {
        event: PointerEvent,
    },
    Key {
        key: String,
        #[serde(default)]
        modifiers: Modifiers,
        #[serde(default)]
        released: bool,
    },
    Modifiers {
        modifiers: Modifiers,
    },
    Action {
        action: Action,
    },
    Import {
        result: ImportResult,
    },
    /// Import response stored next to the script.
    ImportFile {
        path: PathBuf,
    },
    Resize {
        size: Size,
    },
    Comment {
        text: String,
    },
    LabelText {
        text: String,
    },
    LabelStyle {
        patch: LabelStylePatch,
    },
    Join {
        room: String,
        user: UserInfo,
    },
    Leave,
    /// A raw relay message.
    Presence {
        message: serde_json::Value,
    },
    Frame,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedStep {
    /// Virtual milliseconds to wait before this step.
    #[serde(default)]
    pub after_ms: u64,
    #[serde(flatten)]
    pub step: Step,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Script {
    pub screen: Option<Size>,
    pub config: CanvasConfig,
    pub steps: Vec<TimedStep>,
}

/// Counters gathered while replaying.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReplayStats {
    pub steps: usize,
    pub frames: usize,
    pub imported: usize,
    pub outgoing: usize,
    pub elapsed_ms: u64,
}

impl Script {
    pub fn from_json(json: &str) -> Result<Self, ScriptError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        Self::from_json(&read(path)?)
    }

    /// Replay every step against `session` starting at `start`.
    ///
    /// Relative `import_file` paths resolve against `base_dir`.
    pub fn replay<B: SceneBackend>(
        &self,
        session: &mut CanvasSession<B>,
        base_dir: &Path,
        start: Instant,
    ) -> Result<ReplayStats, ScriptError> {
        let mut stats = ReplayStats::default();
        let mut now = start;
        for (index, timed) in self.steps.iter().enumerate() {
            let step = index + 1;
            now += Duration::from_millis(timed.after_ms);
            stats.elapsed_ms += timed.after_ms;
            log::debug!("step {}: {:?}", step, timed.step);
            match &timed.step {
                Step::Pointer { event } => session.handle_pointer(event, now),
                Step::Key {
                    key,
                    modifiers,
                    released,
                } => {
                    session.set_modifiers(*modifiers);
                    let event = if *released {
                        KeyEvent::Released(key.clone())
                    } else {
                        KeyEvent::Pressed(key.clone())
                    };
                    session.handle_key(event);
                }
                Step::Modifiers { modifiers } => session.set_modifiers(*modifiers),
                Step::Action { action } => {
                    session.dispatch(action.clone());
                }
                Step::Import { result } => stats.imported += session.import_result(result.clone()),
                Step::ImportFile { path } => {
                    let full = base_dir.join(path);
                    let result = parse_import_response(&read(&full)?)
                        .map_err(|source| ScriptError::Import { step, source })?;
                    stats.imported += session.import_result(result);
                }
                Step::Resize { size } => session.handle_resize(*size, now),
                Step::Comment { text } => {
                    session.submit_comment(text);
                }
                Step::LabelText { text } => {
                    session.commit_label_text(text);
                }
                Step::LabelStyle { patch } => {
                    session.style_selected_labels(*patch);
                }
                Step::Join { room, user } => session.join_room(room, user.clone()),
                Step::Leave => session.leave_room(),
                Step::Presence { message } => {
                    session
                        .receive_presence(&message.to_string(), now)
                        .map_err(|source| ScriptError::Presence { step, source })?;
                }
                Step::Frame => {
                    session
                        .frame(now)
                        .map_err(|source| ScriptError::Scene { step, source })?;
                    stats.frames += 1;
                }
            }
            stats.outgoing += session.take_outgoing().len();
            stats.steps += 1;
        }
        Ok(stats)
    }
}

fn read(path: &Path) -> Result<String, ScriptError> {
    std::fs::read_to_string(path).map_err(|source| ScriptError::Io {
        path: path.to_path_buf(),
        source,
    })
}
