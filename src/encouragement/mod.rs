//! Congratulatory comment for the result card.
//!
//! `provide` always resolves to a string: a generated comment when a text
//! service is configured and answers, otherwise a phrase from a fixed pool.
//! Failures are logged and swallowed here so the reveal never gets stuck.

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::config::RevealConfig;
use crate::error::Result;

pub mod gemini;

pub use gemini::GeminiClient;

pub const FALLBACK_COMMENTS: [&str; 4] = [
    "你的努力得到了回報，表現太棒了！",
    "太驚人了！這就是實力的證明！",
    "絕佳的表現，繼續保持這種熱情！",
    "無懈可擊的成績，你是我們的驕傲！",
];

const DEFAULT_NAME: &str = "學生";
const DEFAULT_GRADE: &str = "A";

/// Something that turns a prompt into text. `Ok(None)` means the service
/// answered without any text.
// Single-threaded wasm: no Send bound wanted on the returned future.
#[allow(async_fn_in_trait)]
pub trait TextGenerator {
    async fn generate(&self, prompt: &str, temperature: f32) -> Result<Option<String>>;
}

/// Build the prompt sent to the text service.
pub fn compose_prompt(name: &str, grade: &str, context: &str) -> String {
    let name = if name.is_empty() { DEFAULT_NAME } else { name };
    let grade = if grade.is_empty() { DEFAULT_GRADE } else { grade };
    let context = if context.is_empty() {
        String::new()
    } else {
        format!("特別值得稱讚的地方是：「{context}」。")
    };
    format!(
        "這是一個給學生的期末成績揭曉頁面。\n\
         學生姓名：{name}\n\
         成績：{grade}\n\
         {context}\n\
         請給出一句針對這個學生的簡短、充滿活力、溫暖且令人振奮的評語（繁體中文，40字以內）。\n\
         語氣要像是老師對學生說話，請包含學生的名字。"
    )
}

pub struct EncouragementProvider<G, R = StdRng> {
    generator: Option<G>,
    temperature: f32,
    rng: R,
}

impl EncouragementProvider<GeminiClient> {
    /// Gemini-backed provider when a key is configured, fallback-only otherwise.
    pub fn from_config(config: &RevealConfig) -> Self {
        Self::new(GeminiClient::from_config(config), config.temperature, StdRng::from_entropy())
    }
}

impl<G: TextGenerator, R: Rng> EncouragementProvider<G, R> {
    pub fn new(generator: Option<G>, temperature: f32, rng: R) -> Self {
        Self { generator, temperature, rng }
    }

    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    pub fn fallback(&mut self) -> &'static str {
        FALLBACK_COMMENTS[self.rng.gen_range(0..FALLBACK_COMMENTS.len())]
    }

    pub async fn provide(&mut self, name: &str, grade: &str, context: &str) -> String {
        let Some(generator) = &self.generator else {
            log::warn!("API key not found, using fallback");
            return self.fallback().to_owned();
        };
        let prompt = compose_prompt(name, grade, context);
        match generator.generate(&prompt, self.temperature).await {
            Ok(Some(text)) if !text.trim().is_empty() => text.trim().to_owned(),
            Ok(_) => FALLBACK_COMMENTS[0].to_owned(),
            Err(err) => {
                log::error!("error fetching encouragement: {err}");
                self.fallback().to_owned()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RevealError;
    use futures::channel::oneshot;
    use futures::executor::block_on;
    use std::cell::RefCell;
    use std::time::{Duration, Instant};

    struct Failing;
    impl TextGenerator for Failing {
        async fn generate(&self, _prompt: &str, _temperature: f32) -> Result<Option<String>> {
            Err(RevealError::Js("network down".into()))
        }
    }

    /// Echoes the student line of the prompt back, padded with whitespace.
    struct Echo {
        seen_temperature: RefCell<Option<f32>>,
    }
    impl TextGenerator for Echo {
        async fn generate(&self, prompt: &str, temperature: f32) -> Result<Option<String>> {
            *self.seen_temperature.borrow_mut() = Some(temperature);
            let line = prompt.lines().find(|l| l.starts_with("學生姓名")).unwrap_or_default();
            Ok(Some(format!("  {line}，做得好！\n")))
        }
    }

    struct Fixed(Option<&'static str>);
    impl TextGenerator for Fixed {
        async fn generate(&self, _prompt: &str, _temperature: f32) -> Result<Option<String>> {
            Ok(self.0.map(str::to_owned))
        }
    }

    /// Waits on a connection that is closed without ever answering.
    struct Hangup(RefCell<Option<oneshot::Receiver<String>>>);
    impl TextGenerator for Hangup {
        async fn generate(&self, _prompt: &str, _temperature: f32) -> Result<Option<String>> {
            let rx = self.0.borrow_mut().take().ok_or_else(|| RevealError::Js("reused".into()))?;
            rx.await.map(Some).map_err(|_| RevealError::Js("connection closed".into()))
        }
    }

    fn provider<G: TextGenerator>(g: Option<G>) -> EncouragementProvider<G> {
        EncouragementProvider::new(g, 0.7, StdRng::seed_from_u64(7))
    }

    #[test]
    fn prompt_embeds_fields_and_defaults() {
        let p = compose_prompt("小明", "A+", "主動幫助同學");
        assert!(p.contains("學生姓名：小明"));
        assert!(p.contains("成績：A+"));
        assert!(p.contains("特別值得稱讚的地方是：「主動幫助同學」。"));

        let p = compose_prompt("", "", "");
        assert!(p.contains("學生姓名：學生"));
        assert!(p.contains("成績：A"));
        assert!(!p.contains("特別值得稱讚"));
    }

    #[test]
    fn generated_text_is_trimmed_and_names_student() {
        let echo = Echo { seen_temperature: RefCell::new(None) };
        let mut p = provider(Some(echo));
        let text = block_on(p.provide("小明", "A+", "主動幫助同學"));
        assert!(!text.is_empty());
        assert!(text.contains("小明"));
        assert_eq!(text, text.trim());
        let seen = p.generator.as_ref().and_then(|g| *g.seen_temperature.borrow());
        assert_eq!(seen, Some(0.7));
    }

    #[test]
    fn no_generator_uses_pool() {
        let mut p = provider::<Failing>(None);
        for _ in 0..20 {
            let text = block_on(p.provide("小明", "A+", "主動幫助同學"));
            assert!(FALLBACK_COMMENTS.contains(&text.as_str()));
        }
    }

    #[test]
    fn generator_error_is_swallowed() {
        let mut p = provider(Some(Failing));
        let text = block_on(p.provide("小華", "B", ""));
        assert!(FALLBACK_COMMENTS.contains(&text.as_str()));
    }

    #[test]
    fn empty_reply_uses_first_fallback() {
        for reply in [None, Some(""), Some("   \n")] {
            let mut p = provider(Some(Fixed(reply)));
            assert_eq!(block_on(p.provide("", "", "")), FALLBACK_COMMENTS[0]);
        }
    }

    #[test]
    fn hung_up_remote_resolves_to_fallback_promptly() {
        let (tx, rx) = oneshot::channel::<String>();
        let closer = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            drop(tx);
        });
        let mut p = provider(Some(Hangup(RefCell::new(Some(rx)))));
        let started = Instant::now();
        let text = block_on(p.provide("小明", "A", ""));
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(FALLBACK_COMMENTS.contains(&text.as_str()));
        closer.join().unwrap();
    }

    #[test]
    fn seeded_fallback_is_reproducible() {
        let mut a = provider::<Failing>(None);
        let mut b = provider::<Failing>(None);
        let picks_a: Vec<_> = (0..8).map(|_| a.fallback()).collect();
        let picks_b: Vec<_> = (0..8).map(|_| b.fallback()).collect();
        assert_eq!(picks_a, picks_b);
    }
}
