//! Assistant configuration with documented defaults
//!
//! Every tunable the pipeline consumes lives here. Values are supplied
//! externally (a TOML file or code); the pipeline never reads files itself
//! beyond [`AssistantConfig::load`].

use crate::core::error::{Result, ZeroError};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration for the understanding-and-routing core
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    // === CLASSIFICATION ===
    /// Confidence at which the classifier stops escalating
    ///
    /// The same value decides whether a later stage is attempted at all.
    /// Results below it are still routed when nothing better exists.
    pub confidence_threshold: f32,

    /// Whether the token-sequence matcher runs after a weak pattern match
    pub secondary_matcher_enabled: bool,

    /// Whether the remote language model is consulted as a last resort
    pub remote_fallback_enabled: bool,

    /// Upper bound on one remote classification call (seconds)
    pub remote_timeout_seconds: f64,

    // === CONTEXT ===
    /// Number of past turns kept per session (strict FIFO)
    pub history_max_turns: usize,

    /// Inactivity after which a session's conversational memory is wiped (seconds)
    pub context_expiry_seconds: f64,

    /// Count chosen locations/apps to derive preferred defaults
    pub learn_preferences: bool,

    // === ENTITIES ===
    /// Extra alias -> canonical application name mappings
    pub custom_aliases: AHashMap<String, String>,

    // === SKILLS ===
    /// Upper bound on one skill execution (seconds)
    pub skill_timeout_seconds: f64,

    /// Skills registered in the disabled state
    pub disabled_skills: Vec<String>,

    /// Remote model transport settings
    pub llm: LlmSettings,
}

/// Transport settings for the remote classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub api_url: String,
    pub model: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_url: "https://api.anthropic.com/v1/messages".into(),
            model: "claude-3-haiku-20240307".into(),
            api_key_env: "LLM_API_KEY".into(),
        }
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.8,
            secondary_matcher_enabled: true,
            remote_fallback_enabled: false,
            remote_timeout_seconds: 3.0,
            history_max_turns: 5,
            context_expiry_seconds: 300.0,
            learn_preferences: true,
            custom_aliases: AHashMap::new(),
            skill_timeout_seconds: 10.0,
            disabled_skills: Vec::new(),
            llm: LlmSettings::default(),
        }
    }
}

impl AssistantConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Reject values the pipeline cannot operate with
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ZeroError::ConfigError(format!(
                "confidence_threshold must be within [0, 1], got {}",
                self.confidence_threshold
            )));
        }
        if self.history_max_turns == 0 {
            return Err(ZeroError::ConfigError(
                "history_max_turns must be at least 1".into(),
            ));
        }
        for (name, value) in [
            ("remote_timeout_seconds", self.remote_timeout_seconds),
            ("context_expiry_seconds", self.context_expiry_seconds),
            ("skill_timeout_seconds", self.skill_timeout_seconds),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ZeroError::ConfigError(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
            Duration::try_from_secs_f64(value).map_err(|e| {
                ZeroError::ConfigError(format!("{} is out of range ({}): {}", name, value, e))
            })?;
        }
        Ok(())
    }

    pub fn remote_timeout(&self) -> Duration {
        seconds(self.remote_timeout_seconds)
    }

    pub fn context_expiry(&self) -> Duration {
        seconds(self.context_expiry_seconds)
    }

    pub fn skill_timeout(&self) -> Duration {
        seconds(self.skill_timeout_seconds)
    }
}

/// Saturating conversion for values that were changed after validation
fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(if value > 0.0 {
        Duration::MAX
    } else {
        Duration::ZERO
    })
}
