//! Capability handlers ("skills") and the router that dispatches to them
//!
//! A skill is anything implementing [`Skill`]: it declares which intents it
//! handles, checks that the entities it needs are present, and executes.
//! Skills never see raw errors from each other; the router turns every
//! failure into a polite [`SkillResponse`].

pub mod router;
pub mod small_talk;
pub mod timer;

use crate::context::state::ContextState;
use crate::core::error::Result;
use crate::core::types::EntitySet;
use crate::nlu::rules::required_entities;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use router::{RouterStats, SkillRouter};
pub use small_talk::SmallTalkSkill;
pub use timer::TimerSkill;

/// Key in [`SkillResponse::data`] carrying a stable error code on fallbacks
pub const ERROR_KEY: &str = "error";

/// Structured result of handling one utterance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillResponse {
    pub success: bool,
    /// Text to speak or display
    pub message: String,
    pub data: Map<String, Value>,
    /// Merged into the session's context after the turn
    pub context_update: Map<String, Value>,
    /// Whether the conversation expects another turn
    pub should_continue: bool,
}

impl SkillResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            should_continue: true,
            ..Self::default()
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            should_continue: true,
            ..Self::default()
        }
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context_update.insert(key.into(), value.into());
        self
    }

    /// Mark the conversation as finished after this response
    pub fn ending(mut self) -> Self {
        self.should_continue = false;
        self
    }

    /// Stable error code set by the router on fallback responses
    pub fn error_code(&self) -> Option<&str> {
        self.data.get(ERROR_KEY).and_then(Value::as_str)
    }
}

/// Listing entry for a registered skill
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillInfo {
    pub name: String,
    pub description: String,
    pub intents: Vec<String>,
    pub enabled: bool,
}

/// Capability handler contract
#[async_trait]
pub trait Skill: Send + Sync {
    /// Unique registry name
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    /// Intents this skill declares support for
    fn supported_intents(&self) -> Vec<String>;

    /// Pure predicate used for routing
    fn can_handle(&self, intent: &str) -> bool {
        self.supported_intents().iter().any(|supported| supported == intent)
    }

    /// Check that every entity needed for `intent` is present
    ///
    /// Inferred entities count. The default consults the shared
    /// required-entity table.
    fn validate(&self, intent: &str, entities: &EntitySet) -> bool {
        required_entities(intent).iter().all(|kind| entities.has(kind))
    }

    async fn execute(
        &self,
        intent: &str,
        entities: &EntitySet,
        context: &ContextState,
    ) -> Result<SkillResponse>;

    /// Called once before the skill is added to the registry
    async fn initialize(&self) -> Result<()> {
        Ok(())
    }

    /// Called once when the skill is removed or the router shuts down
    async fn cleanup(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{kinds, Entity};

    struct Echo;

    #[async_trait]
    impl Skill for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn supported_intents(&self) -> Vec<String> {
            vec!["weather.query".into()]
        }

        async fn execute(
            &self,
            intent: &str,
            _: &EntitySet,
            _: &ContextState,
        ) -> Result<SkillResponse> {
            Ok(SkillResponse::success(intent))
        }
    }

    #[test]
    fn test_default_predicates() {
        let skill = Echo;
        assert!(skill.can_handle("weather.query"));
        assert!(!skill.can_handle("weather.alerts"));

        assert!(!skill.validate("weather.query", &EntitySet::new()));
        let mut entities = EntitySet::new();
        entities.push(Entity::inferred(kinds::LOCATION, "Paris", 0.8));
        assert!(skill.validate("weather.query", &entities));
    }

    #[test]
    fn test_response_builders() {
        let response = SkillResponse::failure("nope")
            .with_data(ERROR_KEY, "skill_not_found")
            .with_context("current_topic", "weather")
            .ending();
        assert!(!response.success);
        assert!(!response.should_continue);
        assert_eq!(response.error_code(), Some("skill_not_found"));
        assert_eq!(response.context_update["current_topic"], "weather");
    }
}
