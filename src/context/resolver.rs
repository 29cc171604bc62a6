//! Fill required entities from conversational memory

use crate::context::state::ContextState;
use crate::core::types::{kinds, Entity, EntitySet};
use crate::nlu::rules::required_entities;

/// Confidence for a value carried over from the current references
pub const REFERENCE_CONFIDENCE: f32 = 0.8;
/// Confidence for a value taken from learned preferences
pub const PREFERENCE_CONFIDENCE: f32 = 0.5;

/// Add inferred entities for anything `intent` requires but the utterance
/// lacked
///
/// Current references are preferred over learned preferences. Entities that
/// are already present are never replaced.
pub fn resolve_missing(intent: &str, mut entities: EntitySet, context: &ContextState) -> EntitySet {
    for kind in required_entities(intent) {
        if entities.has(kind) {
            continue;
        }
        if let Some((value, confidence)) = remembered_value(kind, context) {
            tracing::debug!("Inferred {} = {} for {}", kind, value, intent);
            entities.push(Entity::inferred(*kind, value, confidence));
        }
    }
    entities
}

fn remembered_value(kind: &str, context: &ContextState) -> Option<(String, f32)> {
    let (current, preferred) = match kind {
        kinds::LOCATION => (
            context.current_location.as_deref(),
            context.preferences.preferred_location(),
        ),
        kinds::APP_NAME => (context.current_app.as_deref(), context.preferences.preferred_app()),
        kinds::TOPIC => (context.current_topic.as_deref(), None),
        _ => (None, None),
    };

    current
        .map(|v| (v.to_string(), REFERENCE_CONFIDENCE))
        .or_else(|| preferred.map(|v| (v.to_string(), PREFERENCE_CONFIDENCE)))
}
