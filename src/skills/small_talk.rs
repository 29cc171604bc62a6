//! Greetings, thanks, farewells and "what can you do"

use crate::context::state::ContextState;
use crate::core::error::{Result, ZeroError};
use crate::core::types::EntitySet;
use crate::skills::{Skill, SkillResponse};
use async_trait::async_trait;
use rand::seq::SliceRandom;

const GREETINGS: &[&str] = &[
    "Hello! How can I help?",
    "Hi there! What can I do for you?",
    "Hey! What do you need?",
];

const THANKS: &[&str] = &["You're welcome!", "Happy to help!", "Any time."];

const FAREWELLS: &[&str] = &["Goodbye!", "See you later!", "Bye for now."];

const ABOUT: &[&str] = &[
    "I'm Zero, your assistant. I'm doing well, thanks for asking!",
    "I'm Zero. All systems running smoothly.",
];

const HELP: &str = "I can set timers, check the weather, open and switch between apps, \
                    search the web, and chat a little. Try \"set a timer for 5 minutes\".";

#[derive(Debug, Default)]
pub struct SmallTalkSkill;

impl SmallTalkSkill {
    pub fn new() -> Self {
        Self
    }
}

fn pick(options: &[&'static str]) -> &'static str {
    options.choose(&mut rand::thread_rng()).copied().unwrap_or_default()
}

#[async_trait]
impl Skill for SmallTalkSkill {
    fn name(&self) -> &str {
        "small_talk"
    }

    fn description(&self) -> &str {
        "Greetings, thanks, farewells and help"
    }

    fn supported_intents(&self) -> Vec<String> {
        [
            "smalltalk.greeting",
            "smalltalk.thanks",
            "smalltalk.farewell",
            "smalltalk.question",
            "smalltalk.help",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    async fn execute(
        &self,
        intent: &str,
        _entities: &EntitySet,
        context: &ContextState,
    ) -> Result<SkillResponse> {
        let response = match intent {
            "smalltalk.greeting" => {
                let greeting = pick(GREETINGS);
                match context.preferences.preferred_location() {
                    Some(place) if context.history.is_empty() => {
                        SkillResponse::success(format!(
                            "{} Want the weather for {}?",
                            greeting, place
                        ))
                    }
                    _ => SkillResponse::success(greeting),
                }
            }
            "smalltalk.thanks" => SkillResponse::success(pick(THANKS)),
            "smalltalk.farewell" => SkillResponse::success(pick(FAREWELLS)).ending(),
            "smalltalk.question" => SkillResponse::success(pick(ABOUT)),
            "smalltalk.help" => SkillResponse::success(HELP),
            other => {
                return Err(ZeroError::execution(
                    self.name(),
                    format!("unsupported intent {}", other),
                ))
            }
        };
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_every_intent_answers() {
        let skill = SmallTalkSkill::new();
        let context = ContextState::default();
        for intent in skill.supported_intents() {
            let response = skill.execute(&intent, &EntitySet::new(), &context).await.unwrap();
            assert!(response.success, "{} failed", intent);
            assert!(!response.message.is_empty());
        }
    }

    #[tokio::test]
    async fn test_farewell_ends_conversation() {
        let skill = SmallTalkSkill::new();
        let response = skill
            .execute("smalltalk.farewell", &EntitySet::new(), &ContextState::default())
            .await
            .unwrap();
        assert!(!response.should_continue);
        assert!(FAREWELLS.contains(&response.message.as_str()));
    }

    #[tokio::test]
    async fn test_greeting_offers_preferred_location() {
        let skill = SmallTalkSkill::new();
        let mut context = ContextState::default();
        context.preferences.record_location("Lisbon");
        let response = skill
            .execute("smalltalk.greeting", &EntitySet::new(), &context)
            .await
            .unwrap();
        assert!(response.message.ends_with("Want the weather for Lisbon?"));
    }

    #[tokio::test]
    async fn test_unsupported_intent_is_an_error() {
        let skill = SmallTalkSkill::new();
        let err = skill
            .execute("timer.set", &EntitySet::new(), &ContextState::default())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "skill_execution_failed");
    }
}
