//! Time-bounded conversational memory for one session
//!
//! Every read and write first checks for inactivity expiry; an expired
//! session starts over with empty history, references and preferences.
//! Background tasks live in the [`TaskRegistry`] and survive any reset.

use crate::context::resolver;
use crate::context::state::{ContextState, Turn};
use crate::context::tasks::TaskRegistry;
use crate::core::clock::Clock;
use crate::core::config::AssistantConfig;
use crate::core::types::{kinds, EntitySet, IntentResult, SessionId};
use crate::llm::context::ContextSummary;
use crate::skills::SkillResponse;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// `context_update` keys that set references rather than preferences
pub const LOCATION_KEY: &str = "current_location";
pub const APP_KEY: &str = "current_app";
pub const TOPIC_KEY: &str = "current_topic";

/// Summary returned by [`ContextManager::status`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextStatus {
    pub session: SessionId,
    pub turns: usize,
    pub current_location: Option<String>,
    pub current_app: Option<String>,
    pub current_topic: Option<String>,
    pub active_tasks: usize,
    /// Time until the conversation expires without further activity
    pub expires_in: Duration,
}

pub struct ContextManager {
    session: SessionId,
    state: ContextState,
    last_touch: Instant,
    clock: Arc<dyn Clock>,
    max_turns: usize,
    expiry: Duration,
    learn_preferences: bool,
    tasks: Option<TaskRegistry>,
}

impl ContextManager {
    pub fn new(session: SessionId, config: &AssistantConfig, clock: Arc<dyn Clock>) -> Self {
        let state = ContextState {
            session: Some(session),
            ..ContextState::default()
        };
        Self {
            session,
            state,
            last_touch: clock.now(),
            clock,
            max_turns: config.history_max_turns.max(1),
            expiry: config.context_expiry(),
            learn_preferences: config.learn_preferences,
            tasks: None,
        }
    }

    /// Report this session's background tasks in snapshots
    pub fn with_tasks(mut self, tasks: TaskRegistry) -> Self {
        self.tasks = Some(tasks);
        self
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Whether the inactivity window has elapsed (no side effects)
    pub fn is_expired(&self) -> bool {
        self.clock.now().saturating_duration_since(self.last_touch) > self.expiry
    }

    fn check_expiry(&mut self) {
        if self.is_expired() && !self.state.is_empty() {
            tracing::info!("Context for session {} expired; starting fresh", self.session);
            self.state.clear_conversation();
        }
    }

    /// Read-only snapshot of the session
    pub fn get_context(&mut self) -> ContextState {
        self.check_expiry();
        let mut snapshot = self.state.clone();
        if let Some(tasks) = &self.tasks {
            snapshot.active_tasks = tasks
                .list_for_session(self.session)
                .into_iter()
                .map(|info| (info.name.clone(), info))
                .collect();
        }
        snapshot
    }

    /// Augment `entities` with values remembered for `intent`'s requirements
    pub fn resolve_missing(&mut self, intent: &str, entities: EntitySet) -> EntitySet {
        self.check_expiry();
        resolver::resolve_missing(intent, entities, &self.state)
    }

    /// Record a handled turn
    ///
    /// History only grows by appending; the oldest turn is evicted once the
    /// limit is reached.
    pub fn update(
        &mut self,
        utterance: &str,
        intent: &IntentResult,
        entities: &EntitySet,
        response: &SkillResponse,
    ) {
        self.check_expiry();

        self.state.history.push_back(Turn {
            utterance: utterance.to_string(),
            intent: intent.intent().to_string(),
            confidence: intent.confidence(),
            entities: entities.clone(),
            response: response.message.clone(),
            success: response.success,
            at: Utc::now(),
        });
        while self.state.history.len() > self.max_turns {
            self.state.history.pop_front();
        }

        self.update_references(intent, entities);
        if self.learn_preferences {
            self.learn(entities);
        }
        self.apply_context_update(response);

        self.touch();
    }

    /// Writes count as activity; reads never do
    fn touch(&mut self) {
        let now = Utc::now();
        self.state.last_activity = Some(self.state.last_activity.map_or(now, |prev| prev.max(now)));
        self.last_touch = self.last_touch.max(self.clock.now());
    }

    fn update_references(&mut self, intent: &IntentResult, entities: &EntitySet) {
        if let Some(location) = entities.text_value(kinds::LOCATION) {
            self.state.current_location = Some(location.to_string());
        }
        if let Some(app) = entities.text_value(kinds::APP_NAME) {
            self.state.current_app = Some(app.to_string());
        }
        if !intent.is_unknown() {
            if let Some(topic) = intent.namespace() {
                self.state.current_topic = Some(topic.to_string());
            }
        }
    }

    /// Only values the user actually said count towards preferences
    fn learn(&mut self, entities: &EntitySet) {
        for entity in entities.explicit() {
            let Some(value) = entity.value.as_str() else {
                continue;
            };
            match entity.entity_type.as_str() {
                kinds::LOCATION => self.state.preferences.record_location(value),
                kinds::APP_NAME => self.state.preferences.record_app(value),
                _ => {}
            }
        }
    }

    fn apply_context_update(&mut self, response: &SkillResponse) {
        for (key, value) in &response.context_update {
            let text = value.as_str().map(str::to_string);
            match key.as_str() {
                LOCATION_KEY => self.state.current_location = text,
                APP_KEY => self.state.current_app = text,
                TOPIC_KEY => self.state.current_topic = text,
                _ => {
                    self.state.preferences.settings.insert(key.clone(), value.clone());
                }
            }
        }
    }

    /// The `count` most recent turns, oldest first
    pub fn get_history(&mut self, count: usize) -> Vec<Turn> {
        self.check_expiry();
        self.state.recent(count).cloned().collect()
    }

    /// Short text rendering of the conversation
    pub fn get_context_summary(&mut self) -> String {
        let snapshot = self.get_context();
        ContextSummary::from_state(&snapshot).summary()
    }

    pub fn get_preference(&mut self, key: &str) -> Option<serde_json::Value> {
        self.check_expiry();
        self.state.preferences.settings.get(key).cloned()
    }

    pub fn set_preference(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.check_expiry();
        self.state.preferences.settings.insert(key.into(), value);
        self.touch();
    }

    /// Explicitly forget the conversation (tasks keep running)
    pub fn reset(&mut self) {
        tracing::info!("Context for session {} reset", self.session);
        self.state.clear_conversation();
    }

    pub fn status(&mut self) -> ContextStatus {
        let snapshot = self.get_context();
        let idle = self.clock.now().saturating_duration_since(self.last_touch);
        ContextStatus {
            session: self.session,
            turns: snapshot.history.len(),
            current_location: snapshot.current_location,
            current_app: snapshot.current_app,
            current_topic: snapshot.current_topic,
            active_tasks: snapshot.active_tasks.len(),
            expires_in: self.expiry.saturating_sub(idle),
        }
    }
}

impl std::fmt::Debug for ContextManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextManager")
            .field("session", &self.session)
            .field("turns", &self.state.history.len())
            .finish()
    }
}
