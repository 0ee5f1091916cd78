//! `generateContent` client for the Gemini REST API, called through `fetch`.

use serde::{Deserialize, Serialize};
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response};

use super::TextGenerator;
use crate::config::RevealConfig;
use crate::error::{RevealError, Result};

#[derive(Clone, Debug)]
pub struct GeminiClient {
    api_key: String,
    endpoint: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self { api_key: api_key.into(), endpoint: endpoint.into(), model: model.into() }
    }

    /// Client for the configured key, or `None` when no key is set.
    pub fn from_config(config: &RevealConfig) -> Option<Self> {
        config
            .credential()
            .map(|key| Self::new(key, config.endpoint.as_str(), config.model.as_str()))
    }

    pub fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint.trim_end_matches('/'), self.model)
    }
}

impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str, temperature: f32) -> Result<Option<String>> {
        let body = serde_json::to_string(&GenerateRequest::new(prompt, temperature))?;

        let init = RequestInit::new();
        init.set_method("POST");
        init.set_mode(RequestMode::Cors);
        init.set_body(&JsValue::from_str(&body));
        let request = Request::new_with_str_and_init(&self.url(), &init)?;
        request.headers().set("Content-Type", "application/json")?;
        request.headers().set("x-goog-api-key", &self.api_key)?;

        let win = web_sys::window().ok_or_else(|| RevealError::Js("no window".into()))?;
        let response: Response = JsFuture::from(win.fetch_with_request(&request)).await?.dyn_into()?;
        if !response.ok() {
            return Err(RevealError::Http { status: response.status() });
        }
        let text = JsFuture::from(response.text()?).await?.as_string().unwrap_or_default();
        let parsed: GenerateResponse = serde_json::from_str(&text)?;
        Ok(parsed.text())
    }
}

// --- Wire types -------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

impl<'a> GenerateRequest<'a> {
    pub fn new(prompt: &'a str, temperature: f32) -> Self {
        Self {
            contents: [Content { parts: [Part { text: prompt }] }],
            generation_config: GenerationConfig { temperature },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateResponse {
    /// Text parts of the first candidate joined together, `None` if there are none.
    pub fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let texts: Vec<&str> = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        if texts.is_empty() { None } else { Some(texts.concat()) }
    }
}
