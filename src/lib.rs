//! Grade Reveal core crate.
//!
//! A fireworks rocket climbs and bursts on a full-screen canvas. Once the burst
//! settles, a button reveals the student's grade together with an encouraging
//! comment from a text-generation service (or a fixed phrase when that is not
//! configured or fails). Student details arrive Base64-encoded in the `data`
//! query parameter.
//!
//! Simulation, decoding, prompt building and view state are plain Rust and are
//! tested natively; the `web_sys` glue sits in `fireworks::render` and `shell`.

use wasm_bindgen::prelude::*;

pub mod config;
pub mod encouragement;
pub mod error;
pub mod fireworks;
pub mod shell;
pub mod student;

pub use config::{FireworksConfig, RevealConfig};
pub use encouragement::{EncouragementProvider, FALLBACK_COMMENTS, TextGenerator};
pub use error::RevealError;
pub use student::StudentData;

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    let level = if cfg!(debug_assertions) { log::Level::Debug } else { log::Level::Info };
    // Fails only if a logger is already installed (e.g. the module was started twice).
    console_log::init_with_level(level).ok();
}

// -----------------------------------------------------------------------------
// Entrypoints
// -----------------------------------------------------------------------------

/// Mount the page with the built-in configuration.
#[wasm_bindgen]
pub fn start_reveal() -> Result<(), JsValue> {
    shell::mount(RevealConfig::default())
}

/// Mount the page with a partial JSON `RevealConfig`; missing keys keep their defaults.
#[wasm_bindgen]
pub fn start_reveal_with_config(json: &str) -> Result<(), JsValue> {
    let config = RevealConfig::from_json(json)?;
    shell::mount(config)
}

/// Decode a `data` parameter value into `[name, grade, context]`, defaults on failure.
#[wasm_bindgen]
pub fn decode_student_data(encoded: &str) -> Vec<String> {
    let data = StudentData::decode_or_default(encoded);
    vec![data.name, data.grade, data.context]
}
