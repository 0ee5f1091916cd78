//! Runtime configuration.
//!
//! Defaults mirror the values the page ships with. A host page may pass a
//! partial JSON object to `start_reveal_with_config`; any key it leaves out keeps
//! its default.

use serde::Deserialize;

use crate::error::{RevealError, Result};

/// Compile-time API key, injected by the build the same way the bundler used to
/// inline `process.env.API_KEY`.
const BUILD_API_KEY: Option<&str> = option_env!("API_KEY");

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct RevealConfig {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    /// Pause after the comment resolves before the result card shows.
    pub reveal_delay_ms: u32,
    pub emoji_lifetime_ms: u32,
    pub emoji_per_tap: usize,
    pub fireworks: FireworksConfig,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            api_key: BUILD_API_KEY.map(str::to_owned),
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            model: DEFAULT_MODEL.to_owned(),
            temperature: 0.7,
            reveal_delay_ms: 800,
            emoji_lifetime_ms: 1500,
            emoji_per_tap: 5,
            fireworks: FireworksConfig::default(),
        }
    }
}

impl RevealConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.fireworks.validate()?;
        Ok(config)
    }

    /// API key if one is set and non-blank. An empty string counts as absent.
    pub fn credential(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

/// Tuning for the rocket and burst. Velocities are pixels per frame.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct FireworksConfig {
    /// Rocket climb per frame as a fraction of viewport height.
    pub ascent_rate: f64,
    /// Burst height as a fraction of viewport height (measured from the top).
    pub target_fraction: f64,
    pub particle_count: usize,
    pub min_speed: f64,
    pub max_speed: f64,
    pub min_radius: f64,
    pub max_radius: f64,
    /// Per-frame velocity multiplier, in (0, 1).
    pub friction: f64,
    /// Scales velocity into displacement for a slow-motion look.
    pub slow_motion: f64,
    /// Max particle speed under which the burst counts as settled.
    pub settle_threshold: f64,
    pub rocket_radius: f64,
}

impl FireworksConfig {
    /// Reject tuning that would keep the burst from ever settling. Comparisons
    /// are written so NaN fails them too.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(RevealError::Config(msg));
        if !(self.friction > 0.0 && self.friction < 1.0) {
            return invalid(format!("friction must be in (0, 1), got {}", self.friction));
        }
        if !(self.ascent_rate > 0.0) {
            return invalid(format!("ascent_rate must be > 0, got {}", self.ascent_rate));
        }
        if !(self.settle_threshold > 0.0) {
            return invalid(format!("settle_threshold must be > 0, got {}", self.settle_threshold));
        }
        if !(self.min_speed <= self.max_speed) {
            return invalid(format!("min_speed {} exceeds max_speed {}", self.min_speed, self.max_speed));
        }
        if !(self.min_radius <= self.max_radius) {
            return invalid(format!("min_radius {} exceeds max_radius {}", self.min_radius, self.max_radius));
        }
        Ok(())
    }
}

impl Default for FireworksConfig {
    fn default() -> Self {
        Self {
            ascent_rate: 0.006,
            target_fraction: 0.35,
            particle_count: 500,
            min_speed: 5.0,
            max_speed: 20.0,
            min_radius: 2.0,
            max_radius: 6.0,
            friction: 0.96,
            slow_motion: 0.4,
            settle_threshold: 0.5,
            rocket_radius: 4.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = RevealConfig::from_json(r#"{"temperature":0.2,"fireworks":{"particle_count":64}}"#).unwrap();
        assert!((cfg.temperature - 0.2).abs() < 1e-6);
        assert_eq!(cfg.fireworks.particle_count, 64);
        assert_eq!(cfg.fireworks.friction, 0.96);
        assert_eq!(cfg.model, DEFAULT_MODEL);
        assert_eq!(cfg.reveal_delay_ms, 800);
    }

    #[test]
    fn blank_key_is_no_credential() {
        let mut cfg = RevealConfig { api_key: Some("   ".into()), ..RevealConfig::default() };
        assert_eq!(cfg.credential(), None);
        cfg.api_key = None;
        assert_eq!(cfg.credential(), None);
        cfg.api_key = Some("k-123".into());
        assert_eq!(cfg.credential(), Some("k-123"));
    }

    #[test]
    fn defaults_are_valid() {
        assert!(FireworksConfig::default().validate().is_ok());
    }

    #[test]
    fn stalling_tuning_is_rejected() {
        for json in [
            r#"{"fireworks":{"friction":1.0}}"#,
            r#"{"fireworks":{"friction":0.0}}"#,
            r#"{"fireworks":{"friction":1.5}}"#,
            r#"{"fireworks":{"ascent_rate":0.0}}"#,
            r#"{"fireworks":{"ascent_rate":-0.01}}"#,
            r#"{"fireworks":{"settle_threshold":0.0}}"#,
            r#"{"fireworks":{"min_speed":30.0,"max_speed":20.0}}"#,
            r#"{"fireworks":{"min_radius":8.0,"max_radius":2.0}}"#,
        ] {
            let err = RevealConfig::from_json(json).unwrap_err();
            assert!(matches!(err, RevealError::Config(_)), "{json}: {err}");
        }
    }

    #[test]
    fn accepted_tuning_still_settles() {
        use crate::fireworks::{Controller, Simulation, Viewport};
        use rand::SeedableRng;
        use rand::rngs::StdRng;
        use std::cell::Cell;
        use std::rc::Rc;

        let cfg = RevealConfig::from_json(r#"{"fireworks":{"friction":0.99,"ascent_rate":0.001,"settle_threshold":0.01}}"#)
            .unwrap();
        let done = Rc::new(Cell::new(false));
        let d = done.clone();
        let sim = Simulation::new(cfg.fireworks, Viewport::new(800.0, 600.0));
        let mut ctl = Controller::new(sim, move || d.set(true));
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..200_000 {
            if done.get() {
                break;
            }
            ctl.tick(&mut rng);
        }
        assert!(done.get());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(RevealConfig::from_json("{not json").is_err());
    }
}
