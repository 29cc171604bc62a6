//! End-to-end pipeline scenarios

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use zero_nlu::context::state::ContextState;
use zero_nlu::core::clock::ManualClock;
use zero_nlu::core::error::Result;
use zero_nlu::core::types::{kinds, ClassificationMethod, EntitySet, SessionId};
use zero_nlu::llm::{RemoteClassifier, RemoteVerdict};
use zero_nlu::skills::{Skill, SkillResponse};
use zero_nlu::{Assistant, AssistantConfig};

/// Reports the location and whether it was inferred
struct WeatherStub;

#[async_trait]
impl Skill for WeatherStub {
    fn name(&self) -> &str {
        "weather"
    }

    fn supported_intents(&self) -> Vec<String> {
        vec!["weather.query".into()]
    }

    async fn execute(
        &self,
        _intent: &str,
        entities: &EntitySet,
        _context: &ContextState,
    ) -> Result<SkillResponse> {
        let location = entities.get(kinds::LOCATION).expect("validated");
        Ok(SkillResponse::success(format!("Weather for {}", location.value))
            .with_data("location", location.value.to_string())
            .with_data("inferred", location.is_inferred()))
    }
}

struct ScriptedRemote {
    intent: &'static str,
    confidence: f32,
    delay: Duration,
}

#[async_trait]
impl RemoteClassifier for ScriptedRemote {
    async fn classify_remote(
        &self,
        _text: &str,
        _summary: &str,
        _timeout: Duration,
    ) -> Result<RemoteVerdict> {
        tokio::time::sleep(self.delay).await;
        Ok(RemoteVerdict {
            intent: self.intent.to_string(),
            confidence: self.confidence,
            reasoning: None,
        })
    }
}

async fn assistant_with(config: AssistantConfig) -> Assistant {
    let assistant = Assistant::new(config).unwrap();
    assistant.register_default_skills().await.unwrap();
    assistant.register_skill(Arc::new(WeatherStub)).await.unwrap();
    assistant
}

async fn assistant() -> Assistant {
    assistant_with(AssistantConfig::default()).await
}

#[tokio::test(start_paused = true)]
async fn test_five_minute_timer() {
    let assistant = assistant().await;
    let session = SessionId::new();

    let result = assistant.process(session, "set a timer for 5 minutes").await;

    assert_eq!(result.intent.intent(), "timer.set");
    assert_eq!(result.entities.value(kinds::DURATION).and_then(|v| v.as_i64()), Some(300));
    assert!(result.response.success);
    assert_eq!(result.response.data["duration_seconds"], 300);

    let timers = assistant.tasks().list_for_session(session);
    assert_eq!(timers.len(), 1);
    assert_eq!(timers[0].kind, "timer");
}

#[tokio::test]
async fn test_weather_follow_up_reuses_location() {
    let assistant = assistant().await;
    let session = SessionId::new();

    let first = assistant.process(session, "What's the weather in Tokyo").await;
    assert_eq!(first.intent.intent(), "weather.query");
    assert_eq!(first.response.data["location"], "Tokyo");
    assert_eq!(first.response.data["inferred"], false);

    let second = assistant.process(session, "what about tomorrow").await;
    assert_eq!(second.intent.intent(), "weather.query");
    assert_eq!(second.intent.method(), ClassificationMethod::SecondaryMatcher);
    let location = second.entities.get(kinds::LOCATION).unwrap();
    assert_eq!(location.value.as_str(), Some("Tokyo"));
    assert!(location.is_inferred());
    assert!(second.entities.has(kinds::DATE));
    assert!(second.response.success);
}

#[tokio::test]
async fn test_sessions_do_not_share_context() {
    let assistant = assistant().await;
    let tokyo = SessionId::new();
    let other = SessionId::new();

    assistant.process(tokyo, "What's the weather in Tokyo").await;
    let result = assistant.process(other, "what about tomorrow").await;

    assert!(result.intent.is_unknown());
    assert!(!result.response.success);
}

#[tokio::test]
async fn test_missing_location_without_memory_asks_for_more() {
    let assistant = assistant().await;
    let result = assistant.process(SessionId::new(), "what's the weather like").await;

    assert_eq!(result.intent.intent(), "weather.query");
    assert!(!result.response.success);
    assert_eq!(result.response.error_code(), Some("entity_validation_failed"));
    assert!(!result.response.message.is_empty());
}

#[tokio::test]
async fn test_expired_context_forgets_location() {
    let clock = ManualClock::new();
    let assistant =
        Assistant::with_clock(AssistantConfig::default(), Arc::new(clock.clone())).unwrap();
    assistant.register_skill(Arc::new(WeatherStub)).await.unwrap();
    let session = SessionId::new();

    assistant.process(session, "What's the weather in Tokyo").await;
    clock.advance(Duration::from_secs(301));

    let result = assistant.process(session, "what about tomorrow").await;
    assert!(result.intent.is_unknown());
    assert!(!result.entities.has(kinds::LOCATION));

    assert_eq!(assistant.prune_expired(), 0);
    clock.advance(Duration::from_secs(301));
    assert_eq!(assistant.prune_expired(), 1);
}

#[tokio::test]
async fn test_context_reset_keeps_timers_running() {
    let assistant = assistant().await;
    let session = SessionId::new();

    assistant.process(session, "set a timer for 10 minutes").await;
    let handle = assistant.sessions().get_or_create(session);
    handle.lock().await.reset();

    assert_eq!(assistant.tasks().list_for_session(session).len(), 1);
    assert_eq!(handle.lock().await.get_context().active_tasks.len(), 1);
    assistant.shutdown().await;
}

#[tokio::test]
async fn test_remote_fallback_classifies_unmatched_text() {
    let config = AssistantConfig {
        remote_fallback_enabled: true,
        ..AssistantConfig::default()
    };
    let assistant = assistant_with(config).await.with_remote(Arc::new(ScriptedRemote {
        intent: "smalltalk.thanks",
        confidence: 0.7,
        delay: Duration::ZERO,
    }));

    let result = assistant.process(SessionId::new(), "much obliged").await;
    assert_eq!(result.intent.intent(), "smalltalk.thanks");
    assert_eq!(result.intent.method(), ClassificationMethod::RemoteFallback);
    assert!(result.response.success);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_remote_call_keeps_local_result() {
    let config = AssistantConfig {
        remote_fallback_enabled: true,
        remote_timeout_seconds: 600.0,
        ..AssistantConfig::default()
    };
    let assistant = assistant_with(config).await.with_remote(Arc::new(ScriptedRemote {
        intent: "smalltalk.thanks",
        confidence: 0.99,
        delay: Duration::from_secs(60),
    }));

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        trigger.cancel();
    });

    let result = assistant
        .process_with_cancel(SessionId::new(), "much obliged", &cancel)
        .await;
    assert!(result.intent.is_unknown());
    assert!(!result.response.success);
}

#[tokio::test(start_paused = true)]
async fn test_remote_timeout_keeps_local_result() {
    let config = AssistantConfig {
        remote_fallback_enabled: true,
        remote_timeout_seconds: 2.0,
        ..AssistantConfig::default()
    };
    let assistant = assistant_with(config).await.with_remote(Arc::new(ScriptedRemote {
        intent: "smalltalk.thanks",
        confidence: 0.99,
        delay: Duration::from_secs(30),
    }));

    let result = assistant.process(SessionId::new(), "much obliged").await;
    assert!(result.intent.is_unknown());
}
