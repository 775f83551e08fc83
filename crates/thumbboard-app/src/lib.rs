//! ThumbBoard Application
//!
//! Drives a canvas session from recorded input, on the command line or in
//! the browser.

mod app;
pub mod script;

pub use app::{App, AppConfig, AppError, BoardSummary};
pub use script::{ReplayStats, Script, ScriptError, Step, TimedStep};

#[cfg(target_arch = "wasm32")]
mod web;

#[cfg(target_arch = "wasm32")]
pub use web::replay_json;
