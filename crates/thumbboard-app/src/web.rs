//! WebAssembly entry point.

use crate::app::App;
use crate::script::Script;
use kurbo::Size;
use std::path::Path;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
    log::info!("ThumbBoard WASM module loaded");
}

/// Replay a session script and return the board summary as JSON.
#[wasm_bindgen]
pub fn replay_json(script: &str, width: f64, height: f64) -> Result<String, JsValue> {
    let script = Script::from_json(script).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let (_, summary) = App::replay(&script, Size::new(width, height), Path::new("."))
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    serde_json::to_string(&summary).map_err(|e| JsValue::from_str(&e.to_string()))
}
