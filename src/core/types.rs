//! Core type definitions used throughout the pipeline

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Reserved label for utterances no stage could classify
pub const UNKNOWN_INTENT: &str = "unknown";

/// Unique identifier for a conversational session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which classification stage produced the winning answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationMethod {
    /// Regex/keyword rules
    Pattern,
    /// Token-sequence matcher with entity hints
    SecondaryMatcher,
    /// External language model
    RemoteFallback,
}

impl fmt::Display for ClassificationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pattern => "pattern",
            Self::SecondaryMatcher => "secondary_matcher",
            Self::RemoteFallback => "remote_fallback",
        };
        write!(f, "{}", s)
    }
}

/// Classified intent for one utterance
///
/// Fields are private so a result cannot be altered after classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentResult {
    intent: String,
    confidence: f32,
    method: ClassificationMethod,
    raw_text: String,
}

impl IntentResult {
    pub fn new(
        intent: impl Into<String>,
        confidence: f32,
        method: ClassificationMethod,
        raw_text: impl Into<String>,
    ) -> Self {
        Self {
            intent: intent.into(),
            confidence: clamp_confidence(confidence),
            method,
            raw_text: raw_text.into(),
        }
    }

    /// Explicit zero-confidence "unknown" result
    pub fn unknown(method: ClassificationMethod, raw_text: impl Into<String>) -> Self {
        Self::new(UNKNOWN_INTENT, 0.0, method, raw_text)
    }

    pub fn intent(&self) -> &str {
        &self.intent
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn method(&self) -> ClassificationMethod {
        self.method
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn is_unknown(&self) -> bool {
        self.intent == UNKNOWN_INTENT
    }

    /// Namespace part of a dotted label ("weather" for "weather.query")
    pub fn namespace(&self) -> Option<&str> {
        intent_namespace(&self.intent)
    }
}

/// Namespace of a dotted intent label
pub fn intent_namespace(intent: &str) -> Option<&str> {
    intent.split_once('.').map(|(ns, _)| ns)
}

pub(crate) fn clamp_confidence(confidence: f32) -> f32 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}

/// Well-known entity type names
pub mod kinds {
    pub const LOCATION: &str = "location";
    pub const DURATION: &str = "duration";
    pub const DATE: &str = "date";
    pub const NUMBER: &str = "number";
    pub const APP_NAME: &str = "app_name";
    pub const TEMPERATURE_UNIT: &str = "temperature_unit";
    pub const WEATHER_CONDITION: &str = "weather_condition";
    pub const TOPIC: &str = "topic";
}

/// Typed value carried by an entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityValue {
    /// Integers, including durations in seconds
    Integer(i64),
    Float(f64),
    Date(NaiveDate),
    Text(String),
}

impl EntityValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(n) => Some(*n as f64),
            Self::Float(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }
}

impl fmt::Display for EntityValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{}", n),
            Self::Float(n) => write!(f, "{}", n),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for EntityValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for EntityValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for EntityValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

/// Whether an entity came from the utterance or from conversational memory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntitySource {
    #[default]
    Explicit,
    Inferred,
}

/// Byte offsets of an entity inside the source utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// A typed parameter extracted from (or inferred for) an utterance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub entity_type: String,
    pub value: EntityValue,
    /// Matched source text (empty for inferred entities)
    pub text: String,
    pub confidence: f32,
    pub span: Option<Span>,
    #[serde(default)]
    pub source: EntitySource,
}

impl Entity {
    pub fn new(
        entity_type: impl Into<String>,
        value: impl Into<EntityValue>,
        text: impl Into<String>,
        confidence: f32,
    ) -> Self {
        Self {
            entity_type: entity_type.into(),
            value: value.into(),
            text: text.into(),
            confidence: clamp_confidence(confidence),
            span: None,
            source: EntitySource::Explicit,
        }
    }

    /// Entity filled in from conversational memory rather than the utterance
    pub fn inferred(
        entity_type: impl Into<String>,
        value: impl Into<EntityValue>,
        confidence: f32,
    ) -> Self {
        Self {
            source: EntitySource::Inferred,
            ..Self::new(entity_type, value, String::new(), confidence)
        }
    }

    pub fn with_span(mut self, start: usize, end: usize) -> Self {
        self.span = Some(Span::new(start, end));
        self
    }

    pub fn is_inferred(&self) -> bool {
        self.source == EntitySource::Inferred
    }
}

/// Ordered collection of entities attached to one utterance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntitySet(Vec<Entity>);

impl EntitySet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// First entity of the given type
    pub fn get(&self, entity_type: &str) -> Option<&Entity> {
        self.0.iter().find(|e| e.entity_type == entity_type)
    }

    pub fn value(&self, entity_type: &str) -> Option<&EntityValue> {
        self.get(entity_type).map(|e| &e.value)
    }

    /// String value of the first entity of the given type
    pub fn text_value(&self, entity_type: &str) -> Option<&str> {
        self.value(entity_type).and_then(EntityValue::as_str)
    }

    pub fn has(&self, entity_type: &str) -> bool {
        self.get(entity_type).is_some()
    }

    pub fn push(&mut self, entity: Entity) {
        self.0.push(entity);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entity> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<Entity> {
        self.0
    }

    /// Entities that appeared literally in the utterance
    pub fn explicit(&self) -> impl Iterator<Item = &Entity> {
        self.0.iter().filter(|e| !e.is_inferred())
    }
}

impl From<Vec<Entity>> for EntitySet {
    fn from(entities: Vec<Entity>) -> Self {
        Self(entities)
    }
}

impl<'a> IntoIterator for &'a EntitySet {
    type Item = &'a Entity;
    type IntoIter = std::slice::Iter<'a, Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_result_clamps_confidence() {
        let high = IntentResult::new("weather.query", 1.7, ClassificationMethod::Pattern, "x");
        let nan = IntentResult::new("weather.query", f32::NAN, ClassificationMethod::Pattern, "x");
        assert_eq!(high.confidence(), 1.0);
        assert_eq!(nan.confidence(), 0.0);
    }

    #[test]
    fn test_intent_namespace() {
        let result = IntentResult::new("timer.set", 0.9, ClassificationMethod::Pattern, "x");
        assert_eq!(result.namespace(), Some("timer"));
        assert_eq!(intent_namespace(UNKNOWN_INTENT), None);
    }

    #[test]
    fn test_method_serialization() {
        let json = serde_json::to_string(&ClassificationMethod::RemoteFallback).unwrap();
        assert_eq!(json, "\"remote_fallback\"");
    }

    #[test]
    fn test_entity_set_lookup() {
        let mut set = EntitySet::new();
        set.push(Entity::new(kinds::LOCATION, "Paris", "Paris", 0.7));
        set.push(Entity::inferred(kinds::APP_NAME, "Slack", 0.5));

        assert_eq!(set.text_value(kinds::LOCATION), Some("Paris"));
        assert!(set.get(kinds::APP_NAME).unwrap().is_inferred());
        assert_eq!(set.explicit().count(), 1);
        assert!(!set.has(kinds::DURATION));
    }

    #[test]
    fn test_entity_value_untagged_roundtrip() {
        let value: EntityValue = serde_json::from_str("300").unwrap();
        assert_eq!(value, EntityValue::Integer(300));
        let value: EntityValue = serde_json::from_str("\"2026-10-19\"").unwrap();
        assert_eq!(value.as_date(), NaiveDate::from_ymd_opt(2026, 10, 19));
    }

    #[test]
    fn test_span_overlap() {
        assert!(Span::new(0, 5).overlaps(&Span::new(4, 8)));
        assert!(!Span::new(0, 4).overlaps(&Span::new(4, 8)));
    }
}
