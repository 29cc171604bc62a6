//! Intent → skill dispatch
//!
//! Routing is first-match-wins over registration order. Resolved mappings
//! are cached per intent; any registry change clears the cache. Execution
//! runs on its own task under a timeout so that errors, panics and hangs in
//! a handler all come back as a fallback response.

use crate::context::state::ContextState;
use crate::core::error::{Result, ZeroError};
use crate::core::types::{EntitySet, IntentResult};
use crate::nlu::rules::required_entities;
use crate::skills::{Skill, SkillInfo, SkillResponse, ERROR_KEY};
use ahash::AHashMap;
use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

pub const UNKNOWN_FALLBACK: &str = "I don't know how to help with that yet.";
pub const VALIDATION_FALLBACK: &str = "I need a little more information to do that.";
pub const EXECUTION_FALLBACK: &str =
    "Sorry, something went wrong while handling that. Please try again.";

struct Registration {
    skill: Arc<dyn Skill>,
    enabled: bool,
}

/// Registry counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RouterStats {
    pub total: usize,
    pub enabled: usize,
    pub disabled: usize,
    pub cached_intents: usize,
}

pub struct SkillRouter {
    registry: RwLock<Vec<Registration>>,
    cache: RwLock<AHashMap<String, Arc<dyn Skill>>>,
    timeout: Duration,
    disabled_names: Vec<String>,
}

impl SkillRouter {
    pub fn new(timeout: Duration) -> Self {
        Self {
            registry: RwLock::new(Vec::new()),
            cache: RwLock::new(AHashMap::new()),
            timeout,
            disabled_names: Vec::new(),
        }
    }

    /// Skills with these names are registered disabled
    pub fn with_disabled(mut self, names: impl IntoIterator<Item = String>) -> Self {
        self.disabled_names = names.into_iter().collect();
        self
    }

    // === REGISTRY ===

    /// Initialize and append a skill
    ///
    /// A skill whose `initialize` fails is not registered. Registering a
    /// name that already exists replaces that handler in place, keeping its
    /// position.
    pub async fn register(&self, skill: Arc<dyn Skill>) -> Result<()> {
        let name = skill.name().to_string();
        skill.initialize().await.map_err(|e| {
            tracing::error!("Skill {} failed to initialize: {}", name, e);
            ZeroError::SkillInit {
                skill: name.clone(),
                reason: e.to_string(),
            }
        })?;

        let enabled = !self.disabled_names.contains(&name);
        let replaced = {
            let mut registry = self.write_registry();
            self.clear_cache();
            match registry.iter_mut().find(|r| r.skill.name() == name) {
                Some(existing) => {
                    let old = std::mem::replace(&mut existing.skill, skill);
                    existing.enabled = enabled;
                    Some(old)
                }
                None => {
                    registry.push(Registration { skill, enabled });
                    None
                }
            }
        };

        if let Some(old) = replaced {
            old.cleanup().await;
            tracing::info!("Replaced skill {}", name);
        } else {
            tracing::info!("Registered skill {} (enabled: {})", name, enabled);
        }
        Ok(())
    }

    /// Remove a skill and run its cleanup hook
    pub async fn unregister(&self, name: &str) -> bool {
        let removed = {
            let mut registry = self.write_registry();
            self.clear_cache();
            registry
                .iter()
                .position(|r| r.skill.name() == name)
                .map(|index| registry.remove(index))
        };

        match removed {
            Some(registration) => {
                registration.skill.cleanup().await;
                tracing::info!("Unregistered skill {}", name);
                true
            }
            None => false,
        }
    }

    pub fn enable(&self, name: &str) -> bool {
        self.set_enabled(name, true)
    }

    pub fn disable(&self, name: &str) -> bool {
        self.set_enabled(name, false)
    }

    fn set_enabled(&self, name: &str, enabled: bool) -> bool {
        let mut registry = self.write_registry();
        let Some(registration) = registry.iter_mut().find(|r| r.skill.name() == name) else {
            return false;
        };
        self.clear_cache();
        registration.enabled = enabled;
        tracing::info!("Skill {} {}", name, if enabled { "enabled" } else { "disabled" });
        true
    }

    fn write_registry(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Registration>> {
        self.registry.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Must run under the registry write lock, before the registry changes
    fn clear_cache(&self) {
        self.cache.write().unwrap_or_else(PoisonError::into_inner).clear();
    }

    // === RESOLUTION ===

    /// First enabled skill (in registration order) that handles `intent`
    pub fn resolve(&self, intent: &str) -> Option<Arc<dyn Skill>> {
        if let Some(skill) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(intent)
        {
            return Some(Arc::clone(skill));
        }

        // Keep the registry locked until the cache entry is written so a
        // concurrent registry change cannot leave a stale mapping behind.
        let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);
        let skill = registry
            .iter()
            .find(|r| r.enabled && r.skill.can_handle(intent))
            .map(|r| Arc::clone(&r.skill))?;
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(intent.to_string(), Arc::clone(&skill));
        drop(registry);

        Some(skill)
    }

    /// Dispatch a classified utterance
    ///
    /// Never fails: unknown intents, missing handlers, validation failures
    /// and handler errors all produce a fallback response whose
    /// `data["error"]` carries the matching error code.
    pub async fn route(
        &self,
        intent: &IntentResult,
        entities: &EntitySet,
        context: &ContextState,
    ) -> SkillResponse {
        if intent.is_unknown() {
            tracing::info!("No intent recognised for '{}'", intent.raw_text());
            let err = ZeroError::SkillNotFound(intent.intent().to_string());
            return fallback(UNKNOWN_FALLBACK, &err);
        }

        let Some(skill) = self.resolve(intent.intent()) else {
            let err = ZeroError::SkillNotFound(intent.intent().to_string());
            tracing::warn!("{}", err);
            return fallback(UNKNOWN_FALLBACK, &err);
        };

        if !skill.validate(intent.intent(), entities) {
            let err = ZeroError::EntityValidationFailed {
                skill: skill.name().to_string(),
                intent: intent.intent().to_string(),
            };
            tracing::warn!("{}", err);
            let missing: Vec<&str> = required_entities(intent.intent())
                .iter()
                .copied()
                .filter(|kind| !entities.has(kind))
                .collect();
            return fallback(VALIDATION_FALLBACK, &err).with_data("missing", missing);
        }

        tracing::info!(
            "Routing {} ({:.2}) to skill {}",
            intent.intent(),
            intent.confidence(),
            skill.name()
        );
        match self.execute(skill, intent.intent(), entities, context).await {
            Ok(response) => response,
            Err(err) => {
                tracing::error!("{}", err);
                fallback(EXECUTION_FALLBACK, &err)
            }
        }
    }

    async fn execute(
        &self,
        skill: Arc<dyn Skill>,
        intent: &str,
        entities: &EntitySet,
        context: &ContextState,
    ) -> Result<SkillResponse> {
        let name = skill.name().to_string();
        let intent = intent.to_string();
        let entities = entities.clone();
        let context = context.clone();

        let mut handle =
            tokio::spawn(async move { skill.execute(&intent, &entities, &context).await });

        match tokio::time::timeout(self.timeout, &mut handle).await {
            Ok(Ok(result)) => result.map_err(|e| ZeroError::execution(&name, e.to_string())),
            Ok(Err(join_error)) => Err(ZeroError::execution(
                &name,
                format!("handler panicked: {}", join_error),
            )),
            Err(_) => {
                handle.abort();
                Err(ZeroError::execution(&name, format!("no response within {:?}", self.timeout)))
            }
        }
    }

    // === INTROSPECTION ===

    pub fn list_skills(&self, enabled_only: bool) -> Vec<SkillInfo> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|r| r.enabled || !enabled_only)
            .map(|r| SkillInfo {
                name: r.skill.name().to_string(),
                description: r.skill.description().to_string(),
                intents: r.skill.supported_intents(),
                enabled: r.enabled,
            })
            .collect()
    }

    /// Human-readable list of what the enabled skills can do
    pub fn help(&self) -> String {
        let skills = self.list_skills(true);
        if skills.is_empty() {
            return "No skills are available right now.".to_string();
        }

        let mut s = String::from("Here's what I can help with:\n");
        for skill in skills {
            let description = if skill.description.is_empty() {
                skill.intents.join(", ")
            } else {
                skill.description
            };
            s.push_str(&format!("- {}: {}\n", skill.name, description));
        }
        s
    }

    pub fn stats(&self) -> RouterStats {
        let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);
        let enabled = registry.iter().filter(|r| r.enabled).count();
        RouterStats {
            total: registry.len(),
            enabled,
            disabled: registry.len() - enabled,
            cached_intents: self.cache.read().unwrap_or_else(PoisonError::into_inner).len(),
        }
    }

    /// Remove every skill, running each cleanup hook
    pub async fn shutdown(&self) {
        let drained: Vec<Registration> = {
            let mut registry = self.write_registry();
            self.clear_cache();
            registry.drain(..).collect()
        };
        for registration in drained {
            registration.skill.cleanup().await;
        }
        tracing::info!("Skill router shut down");
    }
}

/// Generic user-facing response; technical detail stays in the logs
fn fallback(message: &str, err: &ZeroError) -> SkillResponse {
    SkillResponse::failure(message).with_data(ERROR_KEY, err.code())
}
