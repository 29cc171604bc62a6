//! Intent classification cascade
//!
//! Stages run strictly in order and stop as soon as the best result so far
//! reaches the confidence threshold:
//!
//! 1. Pattern: ordered regex rules (always runs)
//! 2. Secondary matcher: token rules with entity and topic hints (optional)
//! 3. Remote fallback: external model call with its own timeout (optional)
//!
//! A later stage replaces an earlier answer only with strictly greater
//! confidence. Nothing here returns an error: an unclassifiable utterance
//! surfaces as a zero-confidence "unknown" intent.

use crate::context::state::ContextState;
use crate::core::config::AssistantConfig;
use crate::core::error::ZeroError;
use crate::core::types::{ClassificationMethod, EntitySet, IntentResult, UNKNOWN_INTENT};
use crate::llm::context::ContextSummary;
use crate::llm::RemoteClassifier;
use crate::nlu::rules::{IntentRule, INTENT_RULES};
use crate::nlu::secondary::SecondaryMatcher;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Ceiling for pattern-stage confidence
const MAX_PATTERN_CONFIDENCE: f32 = 0.95;
/// Scale applied to the matched fraction of the utterance
const PATTERN_COVERAGE_SCALE: f32 = 1.2;

struct CompiledRule {
    intent: &'static str,
    patterns: Vec<Regex>,
}

static COMPILED_RULES: Lazy<Vec<CompiledRule>> = Lazy::new(|| {
    INTENT_RULES
        .iter()
        .map(|rule: &IntentRule| CompiledRule {
            intent: rule.intent,
            patterns: rule
                .patterns
                .iter()
                .map(|p| Regex::new(p).expect("intent patterns are valid"))
                .collect(),
        })
        .collect()
});

/// One step of the classification cascade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Pattern,
    SecondaryMatcher,
    RemoteFallback,
}

impl Stage {
    pub fn method(self) -> ClassificationMethod {
        match self {
            Self::Pattern => ClassificationMethod::Pattern,
            Self::SecondaryMatcher => ClassificationMethod::SecondaryMatcher,
            Self::RemoteFallback => ClassificationMethod::RemoteFallback,
        }
    }
}

/// Label, description and category of a known intent
#[derive(Debug, Clone, Serialize)]
pub struct IntentInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub category: &'static str,
}

/// Hybrid local/remote intent classifier
pub struct IntentClassifier {
    threshold: f32,
    secondary: Option<SecondaryMatcher>,
    remote_enabled: bool,
    remote: Option<Arc<dyn RemoteClassifier>>,
    remote_timeout: Duration,
}

impl IntentClassifier {
    pub fn new(config: &AssistantConfig) -> Self {
        Self {
            threshold: config.confidence_threshold,
            secondary: config.secondary_matcher_enabled.then(SecondaryMatcher::new),
            remote_enabled: config.remote_fallback_enabled,
            remote: None,
            remote_timeout: config.remote_timeout(),
        }
    }

    /// Attach the remote model used by the last stage
    ///
    /// The stage still only runs when remote fallback is enabled in config.
    pub fn with_remote(mut self, remote: Arc<dyn RemoteClassifier>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// The active escalation policy, in evaluation order
    pub fn stages(&self) -> Vec<Stage> {
        let mut stages = vec![Stage::Pattern];
        if self.secondary.is_some() {
            stages.push(Stage::SecondaryMatcher);
        }
        if self.remote_enabled && self.remote.is_some() {
            stages.push(Stage::RemoteFallback);
        }
        stages
    }

    /// Classify without conversational context
    pub async fn classify(&self, text: &str, entities: &EntitySet) -> IntentResult {
        self.classify_with_context(text, entities, None, &CancellationToken::new())
            .await
    }

    /// Run the full cascade
    ///
    /// Cancelling `cancel` abandons an in-flight remote call and keeps the
    /// best local result, exactly as a timeout would.
    pub async fn classify_with_context(
        &self,
        text: &str,
        entities: &EntitySet,
        context: Option<&ContextState>,
        cancel: &CancellationToken,
    ) -> IntentResult {
        let text = text.trim();
        let mut best = IntentResult::unknown(ClassificationMethod::Pattern, text);

        for stage in self.stages() {
            if stage != Stage::Pattern && best.confidence() >= self.threshold {
                break;
            }
            let candidate = match stage {
                Stage::RemoteFallback => self.remote_opinion(text, context, cancel).await,
                local => self.run_local_stage(local, text, entities, context, &best),
            };
            best = escalate(best, candidate);
        }

        self.log_result(&best);
        best
    }

    /// Run only the local stages (never suspends)
    pub fn classify_local(
        &self,
        text: &str,
        entities: &EntitySet,
        context: Option<&ContextState>,
    ) -> IntentResult {
        let text = text.trim();
        let mut best = IntentResult::unknown(ClassificationMethod::Pattern, text);

        for stage in self.stages().into_iter().filter(|s| *s != Stage::RemoteFallback) {
            if stage != Stage::Pattern && best.confidence() >= self.threshold {
                break;
            }
            let candidate = self.run_local_stage(stage, text, entities, context, &best);
            best = escalate(best, candidate);
        }
        best
    }

    fn run_local_stage(
        &self,
        stage: Stage,
        text: &str,
        entities: &EntitySet,
        context: Option<&ContextState>,
        best: &IntentResult,
    ) -> Option<IntentResult> {
        match stage {
            Stage::Pattern => Some(classify_with_patterns(text)),
            Stage::SecondaryMatcher => {
                let matcher = self.secondary.as_ref()?;
                let hint = context.and_then(ContextState::topic_hint);
                let found = matcher.evaluate(text, entities, best.intent(), hint)?;
                Some(IntentResult::new(
                    found.intent,
                    found.confidence,
                    ClassificationMethod::SecondaryMatcher,
                    text,
                ))
            }
            Stage::RemoteFallback => None,
        }
    }

    async fn remote_opinion(
        &self,
        text: &str,
        context: Option<&ContextState>,
        cancel: &CancellationToken,
    ) -> Option<IntentResult> {
        let remote = self.remote.as_ref()?;
        let summary = context
            .map(ContextSummary::from_state)
            .unwrap_or_default()
            .summary();

        tracing::debug!("Escalating to remote classifier: {}", text);
        let call = remote.classify_remote(text, &summary, self.remote_timeout);

        let outcome = tokio::select! {
            _ = cancel.cancelled() => {
                Err(ZeroError::RemoteClassifierUnavailable("cancelled by caller".into()))
            }
            result = tokio::time::timeout(self.remote_timeout, call) => match result {
                Ok(verdict) => verdict,
                Err(_) => Err(ZeroError::RemoteClassifierUnavailable(format!(
                    "no answer within {:?}",
                    self.remote_timeout
                ))),
            },
        };

        match outcome {
            Ok(verdict) if verdict.intent != UNKNOWN_INTENT => Some(IntentResult::new(
                verdict.intent,
                verdict.confidence,
                ClassificationMethod::RemoteFallback,
                text,
            )),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("{}; keeping local result", e);
                None
            }
        }
    }

    fn log_result(&self, result: &IntentResult) {
        if result.confidence() < self.threshold {
            tracing::debug!(
                "{}",
                ZeroError::ClassificationAmbiguous(result.raw_text().to_string())
            );
        }
        tracing::debug!(
            "Final intent: {} ({:.2}, {})",
            result.intent(),
            result.confidence(),
            result.method()
        );
    }

    /// Describe every intent the local rules know about
    pub fn list_intents() -> Vec<IntentInfo> {
        INTENT_RULES
            .iter()
            .map(|rule| IntentInfo {
                name: rule.intent,
                description: rule.description,
                category: rule.intent.split('.').next().unwrap_or(UNKNOWN_INTENT),
            })
            .collect()
    }
}

/// Later stages win only with strictly greater confidence
fn escalate(best: IntentResult, candidate: Option<IntentResult>) -> IntentResult {
    match candidate {
        Some(candidate) if candidate.confidence() > best.confidence() => candidate,
        _ => best,
    }
}

/// First intent (in rule order) with any matching pattern
///
/// Confidence grows with the share of the utterance the strongest pattern
/// of that intent covers.
fn classify_with_patterns(text: &str) -> IntentResult {
    let normalized = text.to_lowercase();
    let text_len = normalized.chars().count();
    if text_len == 0 {
        return IntentResult::unknown(ClassificationMethod::Pattern, text);
    }

    for rule in COMPILED_RULES.iter() {
        let longest = rule
            .patterns
            .iter()
            .filter_map(|p| p.find(&normalized))
            .map(|m| m.as_str().chars().count())
            .max();

        if let Some(matched) = longest {
            let coverage = matched as f32 / text_len as f32;
            let confidence = (coverage * PATTERN_COVERAGE_SCALE).min(MAX_PATTERN_CONFIDENCE);
            tracing::debug!("Pattern match: {} ({:.2})", rule.intent, confidence);
            return IntentResult::new(rule.intent, confidence, ClassificationMethod::Pattern, text);
        }
    }

    IntentResult::unknown(ClassificationMethod::Pattern, text)
}
