use thiserror::Error;

#[derive(Error, Debug)]
pub enum ZeroError {
    #[error("No classification stage reached the confidence threshold for: {0}")]
    ClassificationAmbiguous(String),

    #[error("Skill '{skill}' is missing required entities for intent '{intent}'")]
    EntityValidationFailed { skill: String, intent: String },

    #[error("Skill '{skill}' failed during execution: {reason}")]
    SkillExecutionFailed { skill: String, reason: String },

    #[error("No enabled skill found for: {0}")]
    SkillNotFound(String),

    #[error("Skill '{skill}' failed to initialize: {reason}")]
    SkillInit { skill: String, reason: String },

    #[error("Remote classifier unavailable: {0}")]
    RemoteClassifierUnavailable(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
}

impl ZeroError {
    /// Stable machine-readable code, safe to expose in response data
    pub fn code(&self) -> &'static str {
        match self {
            Self::ClassificationAmbiguous(_) => "classification_ambiguous",
            Self::EntityValidationFailed { .. } => "entity_validation_failed",
            Self::SkillExecutionFailed { .. } => "skill_execution_failed",
            Self::SkillNotFound(_) => "skill_not_found",
            Self::SkillInit { .. } => "skill_init_failed",
            Self::RemoteClassifierUnavailable(_) => "remote_classifier_unavailable",
            Self::LlmError(_) => "llm_error",
            Self::ConfigError(_) => "config_error",
            Self::IoError(_) => "io_error",
            Self::SerdeError(_) => "serde_error",
            Self::TomlError(_) => "toml_error",
        }
    }

    /// Shorthand used by skills to signal an execution failure
    pub fn execution(skill: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SkillExecutionFailed {
            skill: skill.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ZeroError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct_for_routing_failures() {
        let not_found = ZeroError::SkillNotFound("x.y".into());
        let validation = ZeroError::EntityValidationFailed {
            skill: "timer".into(),
            intent: "timer.set".into(),
        };
        let execution = ZeroError::execution("timer", "boom");

        assert_eq!(not_found.code(), "skill_not_found");
        assert_eq!(validation.code(), "entity_validation_failed");
        assert_eq!(execution.code(), "skill_execution_failed");
    }

    #[test]
    fn test_display_includes_skill_name() {
        let err = ZeroError::execution("weather", "timeout");
        assert_eq!(
            err.to_string(),
            "Skill 'weather' failed during execution: timeout"
        );
    }
}
