//! Token-sequence matcher used when pattern matching is not confident
//!
//! Rules work on normalized tokens rather than raw regexes, corroborate
//! guesses with extracted entities, and can continue the previous topic
//! for follow-up utterances such as "what about tomorrow".

use crate::core::types::{intent_namespace, EntitySet, UNKNOWN_INTENT};
use crate::nlu::rules::{TokenRule, ENTITY_HINTS, FOLLOW_UP_ACTIONS, FOLLOW_UP_PHRASES, TOKEN_RULES};

/// Confidence for a plain token-rule match
pub const BASE_CONFIDENCE: f32 = 0.85;
/// Confidence when the token rule agrees with the pattern stage
pub const AGREEMENT_CONFIDENCE: f32 = 0.9;
/// Bonus when an extracted entity supports the guessed intent
pub const ENTITY_BONUS: f32 = 0.05;
/// Ceiling for any local match
pub const MAX_CONFIDENCE: f32 = 0.95;
/// Confidence for intents carried over from the previous turn
pub const FOLLOW_UP_CONFIDENCE: f32 = 0.6;

/// Conversational signal available to the matcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopicHint<'a> {
    /// Namespace of the last handled intent ("weather")
    pub topic: &'a str,
    /// Most recent intent within that namespace
    pub last_intent: Option<&'a str>,
}

/// A proposal from the secondary matcher
#[derive(Debug, Clone, PartialEq)]
pub struct SecondaryMatch {
    pub intent: String,
    pub confidence: f32,
    pub follow_up: bool,
}

pub struct SecondaryMatcher {
    rules: &'static [TokenRule],
}

impl SecondaryMatcher {
    pub fn new() -> Self {
        Self { rules: TOKEN_RULES }
    }

    /// Evaluate an utterance given the pattern stage's guess
    ///
    /// `prior_intent` is the pattern stage's label (possibly "unknown").
    /// The topic hint is only consulted when no rule matched and the pattern
    /// stage found nothing, so context never overrides a local match.
    pub fn evaluate(
        &self,
        text: &str,
        entities: &EntitySet,
        prior_intent: &str,
        hint: Option<TopicHint<'_>>,
    ) -> Option<SecondaryMatch> {
        let tokens = tokenize(text);

        if let Some(rule) = self
            .rules
            .iter()
            .find(|rule| matches_sequence(&tokens, rule.sequence))
        {
            let mut confidence = if rule.intent == prior_intent {
                AGREEMENT_CONFIDENCE
            } else {
                BASE_CONFIDENCE
            };
            if supported_by_entities(rule.intent, entities) {
                confidence += ENTITY_BONUS;
            }
            return Some(SecondaryMatch {
                intent: rule.intent.to_string(),
                confidence: confidence.min(MAX_CONFIDENCE),
                follow_up: false,
            });
        }

        if prior_intent != UNKNOWN_INTENT {
            return None;
        }
        follow_up(text, hint?)
    }
}

impl Default for SecondaryMatcher {
    fn default() -> Self {
        Self::new()
    }
}

fn follow_up(text: &str, hint: TopicHint<'_>) -> Option<SecondaryMatch> {
    let lower = text.to_lowercase();

    let action = FOLLOW_UP_ACTIONS
        .iter()
        .find(|(phrase, _)| lower.contains(phrase));
    let intent = if let Some((_, action)) = action {
        format!("{}.{}", hint.topic, action)
    } else if FOLLOW_UP_PHRASES.iter().any(|phrase| lower.contains(phrase)) {
        let last = hint.last_intent?;
        if intent_namespace(last) != Some(hint.topic) {
            return None;
        }
        last.to_string()
    } else {
        return None;
    };

    tracing::debug!("Follow-up '{}' continues topic '{}' as {}", text, hint.topic, intent);
    Some(SecondaryMatch {
        intent,
        confidence: FOLLOW_UP_CONFIDENCE,
        follow_up: true,
    })
}

/// Lower-case word tokens, keeping inner apostrophes
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|t| t.trim_matches('\'').to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

fn matches_sequence(tokens: &[String], sequence: &[&[&str]]) -> bool {
    if sequence.is_empty() || tokens.len() < sequence.len() {
        return false;
    }
    tokens.windows(sequence.len()).any(|window| {
        window
            .iter()
            .zip(sequence)
            .all(|(token, accepted)| accepted.contains(&token.as_str()))
    })
}

fn supported_by_entities(intent: &str, entities: &EntitySet) -> bool {
    ENTITY_HINTS
        .iter()
        .find(|(name, _)| *name == intent)
        .is_some_and(|(_, kinds)| kinds.iter().any(|kind| entities.has(kind)))
}
