//! Conversation summaries for remote prompts and status output
//!
//! The remote classifier only needs a few lines of context to disambiguate
//! follow-ups, so the summary is deliberately small.

use crate::context::state::ContextState;

/// Maximum number of recent turns included in a summary
const MAX_RECENT_TURNS: usize = 3;

/// Condensed view of a session's conversational state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextSummary {
    pub current_location: Option<String>,
    pub current_app: Option<String>,
    pub current_topic: Option<String>,
    /// (utterance, intent) pairs, oldest first
    pub recent_turns: Vec<(String, String)>,
    /// Descriptions of running background tasks
    pub active_tasks: Vec<String>,
}

impl ContextSummary {
    pub fn from_state(state: &ContextState) -> Self {
        Self {
            current_location: state.current_location.clone(),
            current_app: state.current_app.clone(),
            current_topic: state.current_topic.clone(),
            recent_turns: state
                .recent(MAX_RECENT_TURNS)
                .map(|turn| (turn.utterance.clone(), turn.intent.clone()))
                .collect(),
            active_tasks: state
                .active_tasks
                .values()
                .map(|task| format!("{} ({})", task.description, task.kind))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.current_location.is_none()
            && self.current_app.is_none()
            && self.current_topic.is_none()
            && self.recent_turns.is_empty()
            && self.active_tasks.is_empty()
    }

    /// Generate a text summary of the context
    pub fn summary(&self) -> String {
        if self.is_empty() {
            return "No previous conversation.\n".to_string();
        }

        let mut s = String::new();

        if let Some(topic) = &self.current_topic {
            s.push_str(&format!("Topic: {}\n", topic));
        }
        if let Some(location) = &self.current_location {
            s.push_str(&format!("Location: {}\n", location));
        }
        if let Some(app) = &self.current_app {
            s.push_str(&format!("Application: {}\n", app));
        }

        if !self.recent_turns.is_empty() {
            s.push_str("\nRecent Turns:\n");
            for (utterance, intent) in &self.recent_turns {
                s.push_str(&format!("- \"{}\" -> {}\n", utterance, intent));
            }
        }

        if !self.active_tasks.is_empty() {
            s.push_str(&format!("\nActive Tasks: {}\n", self.active_tasks.join(", ")));
        }

        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::state::Turn;
    use crate::core::types::EntitySet;
    use chrono::Utc;

    fn turn(utterance: &str, intent: &str) -> Turn {
        Turn {
            utterance: utterance.into(),
            intent: intent.into(),
            confidence: 0.9,
            entities: EntitySet::new(),
            response: String::new(),
            success: true,
            at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_summary() {
        let summary = ContextSummary::from_state(&ContextState::default());
        assert!(summary.is_empty());
        assert_eq!(summary.summary(), "No previous conversation.\n");
    }

    #[test]
    fn test_summary_mentions_references() {
        let mut state = ContextState::default();
        state.current_location = Some("Tokyo".into());
        state.current_topic = Some("weather".into());
        state.history.push_back(turn("weather in Tokyo", "weather.query"));

        let text = ContextSummary::from_state(&state).summary();
        assert!(text.contains("Tokyo"));
        assert!(text.contains("weather.query"));
    }

    #[test]
    fn test_recent_turns_limited() {
        let mut state = ContextState::default();
        for i in 0..5 {
            state.history.push_back(turn(&format!("turn {}", i), "smalltalk.greeting"));
        }
        let summary = ContextSummary::from_state(&state);
        assert_eq!(summary.recent_turns.len(), MAX_RECENT_TURNS);
        assert_eq!(summary.recent_turns[0].0, "turn 2");
    }
}
