//! Per-session ownership of context managers
//!
//! Each session gets its own [`ContextManager`] behind an async mutex, so
//! overlapping requests for one session are serialized while different
//! sessions never contend.

use crate::context::manager::ContextManager;
use crate::context::tasks::TaskRegistry;
use crate::core::clock::Clock;
use crate::core::config::AssistantConfig;
use crate::core::types::SessionId;
use ahash::AHashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::Mutex;

pub type SessionHandle = Arc<Mutex<ContextManager>>;

pub struct SessionStore {
    sessions: RwLock<AHashMap<SessionId, SessionHandle>>,
    config: AssistantConfig,
    clock: Arc<dyn Clock>,
    tasks: TaskRegistry,
}

impl SessionStore {
    pub fn new(config: AssistantConfig, clock: Arc<dyn Clock>, tasks: TaskRegistry) -> Self {
        Self {
            sessions: RwLock::new(AHashMap::new()),
            config,
            clock,
            tasks,
        }
    }

    /// Existing session handle, or a fresh one created on first use
    pub fn get_or_create(&self, session: SessionId) -> SessionHandle {
        if let Some(handle) = self.get(session) {
            return handle;
        }

        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions
            .entry(session)
            .or_insert_with(|| {
                tracing::debug!("Created session {}", session);
                let manager = ContextManager::new(session, &self.config, Arc::clone(&self.clock))
                    .with_tasks(self.tasks.clone());
                Arc::new(Mutex::new(manager))
            })
            .clone()
    }

    pub fn get(&self, session: SessionId) -> Option<SessionHandle> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&session)
            .cloned()
    }

    pub fn remove(&self, session: SessionId) -> bool {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&session)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop sessions whose inactivity window has elapsed
    ///
    /// Sessions busy with a request are skipped. Background tasks started
    /// by a pruned session keep running.
    pub fn prune_expired(&self) -> usize {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let before = sessions.len();
        sessions.retain(|_, handle| match handle.try_lock() {
            Ok(manager) => !manager.is_expired(),
            Err(_) => true,
        });
        let pruned = before - sessions.len();
        if pruned > 0 {
            tracing::info!("Pruned {} expired sessions", pruned);
        }
        pruned
    }
}
