//! Student data carried in the `data` query parameter.
//!
//! The host encodes a UTF-8 JSON object as Base64 (spreadsheet scripts produce
//! the standard alphabet with padding). Decoding here is lenient about padding,
//! the URL-safe alphabet, and `+` turned into a space by query parsing. Any
//! failure leaves the defaults in place.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use serde_json::Value;

use crate::error::{RevealError, Result};

const LENIENT: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);
static STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);
static URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);

pub const DEFAULT_GRADE: &str = "A";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StudentData {
    pub name: String,
    /// Display label, not validated as a letter grade.
    pub grade: String,
    pub context: String,
}

impl Default for StudentData {
    fn default() -> Self {
        Self { name: String::new(), grade: DEFAULT_GRADE.to_owned(), context: String::new() }
    }
}

impl StudentData {
    /// Decode a `data` parameter value, reporting why it failed.
    pub fn decode(encoded: &str) -> Result<Self> {
        let bytes = decode_base64(encoded)?;
        let text = String::from_utf8(bytes)?;
        Self::from_json(&text)
    }

    /// Decode, or fall back to the defaults on any error.
    pub fn decode_or_default(encoded: &str) -> Self {
        if encoded.is_empty() {
            return Self::default();
        }
        match Self::decode(encoded) {
            Ok(data) => data,
            Err(err) => {
                log::error!("failed to parse student data: {err}");
                Self::default()
            }
        }
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        let obj = match &value {
            Value::Object(map) => map,
            Value::Null => return Err(RevealError::NotAnObject("null")),
            Value::Bool(_) => return Err(RevealError::NotAnObject("boolean")),
            Value::Number(_) => return Err(RevealError::NotAnObject("number")),
            Value::String(_) => return Err(RevealError::NotAnObject("string")),
            // Indexing an array by key yields nothing, so every field defaults.
            Value::Array(_) => return Ok(Self::default()),
        };
        let defaults = Self::default();
        Ok(Self {
            name: field(obj.get("name")).unwrap_or(defaults.name),
            grade: field(obj.get("grade")).unwrap_or(defaults.grade),
            context: field(obj.get("context")).unwrap_or(defaults.context),
        })
    }

    /// Read the `data` parameter from the current page URL.
    pub fn from_location() -> Self {
        let search = web_sys::window()
            .and_then(|w| w.location().search().ok())
            .unwrap_or_default();
        let param = web_sys::UrlSearchParams::new_with_str(&search)
            .ok()
            .and_then(|p| p.get("data"));
        match param {
            Some(encoded) => Self::decode_or_default(&encoded),
            None => Self::default(),
        }
    }
}

/// Treat a JSON value the way a truthiness check would: empty strings, zero,
/// `false` and `null` are absent.
fn field(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_owned()),
        _ => None,
    }
}

fn decode_base64(encoded: &str) -> Result<Vec<u8>> {
    // Query parsing turns '+' into ' '. Line breaks from wrapped encoders are dropped.
    let cleaned: String = encoded
        .chars()
        .filter_map(|c| match c {
            ' ' => Some('+'),
            '\n' | '\r' | '\t' => None,
            other => Some(other),
        })
        .collect();
    let engine = if cleaned.contains(['-', '_']) { &URL_SAFE_LENIENT } else { &STANDARD_LENIENT };
    Ok(engine.decode(cleaned)?)
}
