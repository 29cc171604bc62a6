//! End-to-end utterance handling
//!
//! extract entities → classify (context as a hint) → fill missing entities
//! from memory → route → record the turn. The session lock is held for the
//! whole request so overlapping requests for one session apply in order.

use crate::context::session::SessionStore;
use crate::context::tasks::TaskRegistry;
use crate::core::clock::{Clock, SystemClock};
use crate::core::config::AssistantConfig;
use crate::core::error::Result;
use crate::core::types::{EntitySet, IntentResult, SessionId};
use crate::llm::RemoteClassifier;
use crate::nlu::entities::EntityExtractor;
use crate::nlu::intent::IntentClassifier;
use crate::skills::router::SkillRouter;
use crate::skills::small_talk::SmallTalkSkill;
use crate::skills::timer::TimerSkill;
use crate::skills::{Skill, SkillResponse};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Everything produced while handling one utterance
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub session: SessionId,
    pub intent: IntentResult,
    /// Entities after resolution (inferred ones are tagged)
    pub entities: EntitySet,
    pub response: SkillResponse,
    pub latency: Duration,
}

pub struct Assistant {
    config: AssistantConfig,
    extractor: EntityExtractor,
    classifier: IntentClassifier,
    router: SkillRouter,
    sessions: SessionStore,
    tasks: TaskRegistry,
}

impl Assistant {
    pub fn new(config: AssistantConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Build with an explicit time source for context expiry
    pub fn with_clock(config: AssistantConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        let tasks = TaskRegistry::new();
        let router = SkillRouter::new(config.skill_timeout())
            .with_disabled(config.disabled_skills.clone());

        Ok(Self {
            extractor: EntityExtractor::with_aliases(&config.custom_aliases),
            classifier: IntentClassifier::new(&config),
            router,
            sessions: SessionStore::new(config.clone(), clock, tasks.clone()),
            tasks,
            config,
        })
    }

    /// Enable the remote classification stage
    pub fn with_remote(mut self, remote: Arc<dyn RemoteClassifier>) -> Self {
        self.classifier = self.classifier.with_remote(remote);
        self
    }

    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    pub fn router(&self) -> &SkillRouter {
        &self.router
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn tasks(&self) -> &TaskRegistry {
        &self.tasks
    }

    pub fn classifier(&self) -> &IntentClassifier {
        &self.classifier
    }

    pub async fn register_skill(&self, skill: Arc<dyn Skill>) -> Result<()> {
        self.router.register(skill).await
    }

    /// Register the built-in timer and small-talk skills
    pub async fn register_default_skills(&self) -> Result<()> {
        self.register_skill(Arc::new(TimerSkill::new(self.tasks.clone()))).await?;
        self.register_skill(Arc::new(SmallTalkSkill::new())).await
    }

    /// Handle one utterance
    pub async fn process(&self, session: SessionId, text: &str) -> PipelineResult {
        self.process_with_cancel(session, text, &CancellationToken::new()).await
    }

    /// Handle one utterance; cancelling abandons only the remote stage
    pub async fn process_with_cancel(
        &self,
        session: SessionId,
        text: &str,
        cancel: &CancellationToken,
    ) -> PipelineResult {
        let started = Instant::now();
        let handle = self.sessions.get_or_create(session);
        let mut context = handle.lock().await;

        let snapshot = context.get_context();
        let entities = self.extractor.extract(text);
        let intent = self
            .classifier
            .classify_with_context(text, &entities, Some(&snapshot), cancel)
            .await;
        let entities = context.resolve_missing(intent.intent(), entities);

        let response = self.router.route(&intent, &entities, &snapshot).await;
        context.update(text, &intent, &entities, &response);
        drop(context);

        let latency = started.elapsed();
        tracing::info!(
            "[{}] '{}' -> {} ({:.2}, {}) success={} in {:?}",
            session,
            text.trim(),
            intent.intent(),
            intent.confidence(),
            intent.method(),
            response.success,
            latency
        );

        PipelineResult {
            session,
            intent,
            entities,
            response,
            latency,
        }
    }

    /// Drop sessions idle past the expiry window
    pub fn prune_expired(&self) -> usize {
        self.sessions.prune_expired()
    }

    /// Cancel background tasks and clean up every skill
    pub async fn shutdown(&self) {
        let cancelled = self.tasks.cancel_all();
        self.router.shutdown().await;
        tracing::info!("Assistant shut down ({} background tasks cancelled)", cancelled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::kinds;

    async fn assistant() -> Assistant {
        let assistant = Assistant::new(AssistantConfig::default()).unwrap();
        assistant.register_default_skills().await.unwrap();
        assistant
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = AssistantConfig {
            confidence_threshold: 1.5,
            ..AssistantConfig::default()
        };
        assert!(Assistant::new(config).is_err());
    }

    #[tokio::test]
    async fn test_greeting_round_trip() {
        let assistant = assistant().await;
        let session = SessionId::new();
        let result = assistant.process(session, "hello").await;
        assert_eq!(result.intent.intent(), "smalltalk.greeting");
        assert!(result.response.success);
        assert_eq!(assistant.sessions().len(), 1);
    }

    #[tokio::test]
    async fn test_gibberish_gets_unknown_fallback() {
        let assistant = assistant().await;
        let result = assistant.process(SessionId::new(), "qwzx blorp").await;
        assert!(result.intent.is_unknown());
        assert!(!result.response.success);
        assert_eq!(result.response.error_code(), Some("skill_not_found"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_request_reaches_registry() {
        let assistant = assistant().await;
        let session = SessionId::new();
        let result = assistant.process(session, "set a timer for 90 seconds").await;
        assert_eq!(result.entities.value(kinds::DURATION).and_then(|v| v.as_i64()), Some(90));
        assert!(result.response.success);
        assert_eq!(assistant.tasks().list_for_session(session).len(), 1);

        assistant.shutdown().await;
        assert!(assistant.tasks().is_empty());
    }
}
