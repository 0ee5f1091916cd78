//! Error types for decoding student data and talking to the text generator.
//!
//! Nothing here is fatal at runtime: every caller that can hit one of these
//! degrades to a default or a fallback phrase. The type exists so the failure is
//! still propagated with `?` and logged with its cause.

use std::string::FromUtf8Error;
use thiserror::Error;
use wasm_bindgen::JsValue;

#[derive(Debug, Error)]
pub enum RevealError {
    /// The `data` parameter is not valid Base64
    #[error("invalid base64 in student data: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Decoded bytes are not UTF-8
    #[error("student data is not valid UTF-8: {0}")]
    Utf8(#[from] FromUtf8Error),

    /// JSON parse failure (student data, config or generator reply)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Student data parsed but was not a JSON object
    #[error("student data must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    /// Remote service answered with a non-success status
    #[error("text service returned HTTP {status}")]
    Http { status: u16 },

    /// Host-supplied configuration would stall or break the animation
    #[error("invalid config: {0}")]
    Config(String),

    /// No API key configured for the text service
    #[error("no API key configured for the text service")]
    MissingCredential,

    /// A browser API threw or returned an unexpected value
    #[error("browser error: {0}")]
    Js(String),
}

impl From<JsValue> for RevealError {
    fn from(value: JsValue) -> Self {
        RevealError::Js(value.as_string().unwrap_or_else(|| format!("{value:?}")))
    }
}

impl From<RevealError> for JsValue {
    fn from(err: RevealError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RevealError>;
