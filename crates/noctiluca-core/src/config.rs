//! Configuration — YAML config + env var overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Seed phrase for deterministic runs; omit for OS entropy.
    #[serde(default)]
    pub seed: Option<String>,

    /// Simulation tick rate (ticks per second)
    #[serde(default = "default_tick_hz")]
    pub tick_hz: f64,

    /// Abstract viewport the entities live in (renderers rescale)
    #[serde(default = "default_viewport_width")]
    pub viewport_width: f64,
    #[serde(default = "default_viewport_height")]
    pub viewport_height: f64,

    /// Seconds of inactivity before auto-returning to idle
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: f64,

    /// Seconds between periodic dream checks while idle
    #[serde(default = "default_dream_check")]
    pub dream_check_secs: f64,

    /// Probability of entering a dream on each check
    #[serde(default = "default_dream_chance")]
    pub dream_chance: f64,

    /// Seconds a periodic dream lasts before returning to idle
    #[serde(default = "default_dream_dwell")]
    pub dream_dwell_secs: f64,

    /// Seconds between an orb's activation explosion and its expansion
    #[serde(default = "default_expand_delay")]
    pub expand_delay_secs: f64,

    /// Seconds child orbs stay out before collapsing en masse
    #[serde(default = "default_child_dwell")]
    pub child_dwell_secs: f64,

    /// Seconds the responding state lingers after a reply settles
    #[serde(default = "default_response_linger")]
    pub response_linger_secs: f64,

    /// Dwell seconds for the voice-triggered states
    #[serde(default = "default_voice_dream_dwell")]
    pub voice_dream_dwell_secs: f64,
    #[serde(default = "default_transcend_dwell")]
    pub transcend_dwell_secs: f64,
    #[serde(default = "default_meditate_dwell")]
    pub meditate_dwell_secs: f64,

    /// Pointer-to-core distance at which resonance falls to zero
    #[serde(default = "default_pointer_threshold")]
    pub pointer_threshold: f64,

    /// Simulated latency of the templated responder
    #[serde(default = "default_responder_delay")]
    pub responder_delay_secs: f64,

    /// Whether spoken replies are enabled (toggled by the voice setting orb)
    #[serde(default = "default_speech_enabled")]
    pub speech_enabled: bool,
}

fn default_tick_hz() -> f64 {
    60.0
}
fn default_viewport_width() -> f64 {
    1920.0
}
fn default_viewport_height() -> f64 {
    1080.0
}
fn default_idle_timeout() -> f64 {
    30.0
}
fn default_dream_check() -> f64 {
    120.0
}
fn default_dream_chance() -> f64 {
    0.3
}
fn default_dream_dwell() -> f64 {
    20.0
}
fn default_expand_delay() -> f64 {
    0.5
}
fn default_child_dwell() -> f64 {
    5.0
}
fn default_response_linger() -> f64 {
    3.0
}
fn default_voice_dream_dwell() -> f64 {
    15.0
}
fn default_transcend_dwell() -> f64 {
    25.0
}
fn default_meditate_dwell() -> f64 {
    30.0
}
fn default_pointer_threshold() -> f64 {
    400.0
}
fn default_responder_delay() -> f64 {
    0.6
}
fn default_speech_enabled() -> bool {
    true
}

impl EngineConfig {
    /// Load config from a YAML file with env var overrides.
    pub fn load(config_path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config: {}", config_path.display()))?;

        let mut config: EngineConfig =
            serde_yaml::from_str(&content).context("Failed to parse config.yaml")?;

        // Seed (env var override)
        if let Ok(seed) = std::env::var("NOCTILUCA_SEED") {
            config.seed = Some(seed);
        }

        // Tick rate (env var override)
        if let Ok(hz) = std::env::var("NOCTILUCA_TICK_HZ") {
            config.tick_hz = hz
                .parse()
                .context("NOCTILUCA_TICK_HZ must be a number")?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load config from the default location (project_root/config.yaml)
    pub fn load_from_dir(project_root: &Path) -> Result<Self> {
        let config_path = project_root.join("config.yaml");
        Self::load(&config_path)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick_hz <= 0.0 || !self.tick_hz.is_finite() {
            anyhow::bail!("tick_hz must be a positive number, got {}", self.tick_hz);
        }
        if self.viewport_width <= 0.0 || self.viewport_height <= 0.0 {
            anyhow::bail!("viewport dimensions must be positive");
        }
        if !(0.0..=1.0).contains(&self.dream_chance) {
            anyhow::bail!("dream_chance must be in [0, 1], got {}", self.dream_chance);
        }
        Ok(())
    }

    /// Seconds per tick.
    pub fn tick_dt(&self) -> f64 {
        1.0 / self.tick_hz
    }

    /// Center of the abstract viewport — where the core lives.
    pub fn center(&self) -> (f64, f64) {
        (self.viewport_width / 2.0, self.viewport_height / 2.0)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: None,
            tick_hz: default_tick_hz(),
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            idle_timeout_secs: default_idle_timeout(),
            dream_check_secs: default_dream_check(),
            dream_chance: default_dream_chance(),
            dream_dwell_secs: default_dream_dwell(),
            expand_delay_secs: default_expand_delay(),
            child_dwell_secs: default_child_dwell(),
            response_linger_secs: default_response_linger(),
            voice_dream_dwell_secs: default_voice_dream_dwell(),
            transcend_dwell_secs: default_transcend_dwell(),
            meditate_dwell_secs: default_meditate_dwell(),
            pointer_threshold: default_pointer_threshold(),
            responder_delay_secs: default_responder_delay(),
            speech_enabled: default_speech_enabled(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_defaults() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(tmp, "seed: luminous").unwrap();

        let config = EngineConfig::load(tmp.path()).unwrap();
        assert_eq!(config.seed.as_deref(), Some("luminous"));
        assert_eq!(config.tick_hz, 60.0);
        assert_eq!(config.idle_timeout_secs, 30.0);
        assert_eq!(config.dream_check_secs, 120.0);
        assert!(config.speech_enabled);
    }

    #[test]
    fn test_load_config_custom_values() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(
            tmp,
            "tick_hz: 30\nviewport_width: 800\nviewport_height: 600\nidle_timeout_secs: 10"
        )
        .unwrap();

        let config = EngineConfig::load(tmp.path()).unwrap();
        assert_eq!(config.tick_hz, 30.0);
        assert_eq!(config.viewport_width, 800.0);
        assert_eq!(config.idle_timeout_secs, 10.0);
        assert_eq!(config.center(), (400.0, 300.0));
    }

    #[test]
    fn test_invalid_tick_rate_fails() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(tmp, "tick_hz: 0").unwrap();

        let result = EngineConfig::load(tmp.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_dream_chance_fails() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(tmp, "dream_chance: 1.5").unwrap();

        let result = EngineConfig::load(tmp.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_tick_dt() {
        let config = EngineConfig::default();
        assert!((config.tick_dt() - 1.0 / 60.0).abs() < 1e-12);
    }
}
