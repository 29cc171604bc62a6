//! Per-session conversational state

use crate::context::tasks::TaskInfo;
use crate::core::types::{intent_namespace, EntitySet, SessionId};
use crate::nlu::secondary::TopicHint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// One handled utterance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub utterance: String,
    pub intent: String,
    pub confidence: f32,
    pub entities: EntitySet,
    /// Message returned to the user
    pub response: String,
    pub success: bool,
    pub at: DateTime<Utc>,
}

/// Learned user preferences
///
/// Counts keep first-seen order so ties resolve to the value chosen first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    pub locations: Vec<(String, u32)>,
    pub apps: Vec<(String, u32)>,
    /// Free-form settings written through `context_update` or directly
    pub settings: BTreeMap<String, serde_json::Value>,
}

impl Preferences {
    pub fn record_location(&mut self, location: &str) {
        bump(&mut self.locations, location);
    }

    pub fn record_app(&mut self, app: &str) {
        bump(&mut self.apps, app);
    }

    /// Most requested location
    pub fn preferred_location(&self) -> Option<&str> {
        most_frequent(&self.locations)
    }

    /// Most requested application
    pub fn preferred_app(&self) -> Option<&str> {
        most_frequent(&self.apps)
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty() && self.apps.is_empty() && self.settings.is_empty()
    }
}

fn bump(counts: &mut Vec<(String, u32)>, value: &str) {
    match counts.iter_mut().find(|(v, _)| v == value) {
        Some((_, count)) => *count = count.saturating_add(1),
        None => counts.push((value.to_string(), 1)),
    }
}

fn most_frequent(counts: &[(String, u32)]) -> Option<&str> {
    let mut best: Option<&(String, u32)> = None;
    for entry in counts {
        if best.map_or(true, |(_, n)| entry.1 > *n) {
            best = Some(entry);
        }
    }
    best.map(|(value, _)| value.as_str())
}

/// Snapshot of a session's conversational memory
///
/// Obtained from `ContextManager::get_context`; changes made to a snapshot
/// are never written back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextState {
    pub session: Option<SessionId>,
    /// Oldest first, capped at the configured turn limit
    pub history: VecDeque<Turn>,
    pub current_location: Option<String>,
    pub current_app: Option<String>,
    /// Namespace of the last classified intent ("weather")
    pub current_topic: Option<String>,
    /// Background tasks owned by this session, by name
    pub active_tasks: BTreeMap<String, TaskInfo>,
    pub preferences: Preferences,
    pub last_activity: Option<DateTime<Utc>>,
}

impl ContextState {
    pub fn last_turn(&self) -> Option<&Turn> {
        self.history.back()
    }

    /// The `count` most recent turns, oldest first
    pub fn recent(&self, count: usize) -> impl Iterator<Item = &Turn> {
        self.history.iter().skip(self.history.len().saturating_sub(count))
    }

    /// Current topic plus the last intent handled under it
    pub fn topic_hint(&self) -> Option<TopicHint<'_>> {
        let topic = self.current_topic.as_deref()?;
        let last_intent = self
            .history
            .iter()
            .rev()
            .map(|turn| turn.intent.as_str())
            .find(|intent| intent_namespace(intent) == Some(topic));
        Some(TopicHint { topic, last_intent })
    }

    /// True when nothing has been remembered yet
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
            && self.current_location.is_none()
            && self.current_app.is_none()
            && self.current_topic.is_none()
            && self.preferences.is_empty()
    }

    /// Forget conversation, references and preferences
    ///
    /// Active tasks are left alone; they are owned by the task registry.
    pub(crate) fn clear_conversation(&mut self) {
        self.history.clear();
        self.current_location = None;
        self.current_app = None;
        self.current_topic = None;
        self.preferences = Preferences::default();
        self.last_activity = None;
    }
}
