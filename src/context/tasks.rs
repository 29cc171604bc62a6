//! Registry of background tasks spawned by skills
//!
//! Tasks (running timers, mostly) belong to the skill that started them, not
//! to conversational context: resetting or expiring a session never touches
//! this registry. The registry is cheap to clone and safe to list or cancel
//! from any thread while classification is in progress.

use crate::core::types::SessionId;
use ahash::AHashMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;
use tokio::task::AbortHandle;

const EVENT_CAPACITY: usize = 64;

/// Metadata describing one background task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskInfo {
    /// Unique name within the registry
    pub name: String,
    /// Category of task ("timer")
    pub kind: String,
    /// Session that requested the task, if any
    pub session: Option<SessionId>,
    pub description: String,
    pub started_at: DateTime<Utc>,
    /// When the task is expected to finish
    pub due_at: Option<DateTime<Utc>>,
}

impl TaskInfo {
    pub fn new(
        name: impl Into<String>,
        kind: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            session: None,
            description: description.into(),
            started_at: Utc::now(),
            due_at: None,
        }
    }

    pub fn for_session(mut self, session: SessionId) -> Self {
        self.session = Some(session);
        self
    }

    pub fn due_in(mut self, duration: chrono::Duration) -> Self {
        self.due_at = Some(self.started_at + duration);
        self
    }

    /// Time left until `due_at`, zero once overdue
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<chrono::Duration> {
        self.due_at
            .map(|due| (due - now).max(chrono::Duration::zero()))
    }
}

/// Lifecycle notification broadcast to subscribers
#[derive(Debug, Clone, PartialEq)]
pub enum TaskEvent {
    /// The task ran to completion; `message` is suitable for announcing
    Completed { info: TaskInfo, message: Option<String> },
    Cancelled { info: TaskInfo },
}

struct TaskEntry {
    id: u64,
    info: TaskInfo,
    handle: AbortHandle,
}

struct Inner {
    tasks: RwLock<AHashMap<String, TaskEntry>>,
    events: broadcast::Sender<TaskEvent>,
    next_id: AtomicU64,
}

/// Shared handle to the task registry
#[derive(Clone)]
pub struct TaskRegistry {
    inner: Arc<Inner>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                tasks: RwLock::new(AHashMap::new()),
                events,
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Run `work` in the background under `info.name`
    ///
    /// The future's output becomes the completion message. A task already
    /// registered under the same name is cancelled and replaced. Must be
    /// called from within a tokio runtime.
    pub fn spawn<F>(&self, info: TaskInfo, work: F)
    where
        F: Future<Output = Option<String>> + Send + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let registry = self.clone();
        let name = info.name.clone();

        // Hold the write lock across spawn so the task cannot finish and
        // deregister before it has been inserted.
        let mut tasks = self.inner.tasks.write().unwrap_or_else(PoisonError::into_inner);
        let handle = tokio::spawn(async move {
            let message = work.await;
            registry.finish(&name, id, message);
        });

        let entry = TaskEntry {
            id,
            info: info.clone(),
            handle: handle.abort_handle(),
        };
        if let Some(previous) = tasks.insert(info.name.clone(), entry) {
            previous.handle.abort();
            tracing::debug!("Replaced background task {}", info.name);
        }
        drop(tasks);

        tracing::info!("Started {} task {}", info.kind, info.name);
    }

    fn finish(&self, name: &str, id: u64, message: Option<String>) {
        let finished = {
            let mut tasks = self.inner.tasks.write().unwrap_or_else(PoisonError::into_inner);
            let current = tasks.get(name).is_some_and(|entry| entry.id == id);
            if current {
                tasks.remove(name)
            } else {
                None
            }
        };

        if let Some(entry) = finished {
            tracing::info!("Background task {} completed", name);
            // No subscribers is not an error
            let _ = self.inner.events.send(TaskEvent::Completed {
                info: entry.info,
                message,
            });
        }
    }

    /// Abort a task by name; returns whether it was running
    pub fn cancel(&self, name: &str) -> bool {
        let removed = self
            .inner
            .tasks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name);

        match removed {
            Some(entry) => {
                entry.handle.abort();
                tracing::info!("Cancelled background task {}", name);
                let _ = self.inner.events.send(TaskEvent::Cancelled { info: entry.info });
                true
            }
            None => false,
        }
    }

    /// Abort every task; returns how many were running
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<TaskEntry> = self
            .inner
            .tasks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .map(|(_, entry)| entry)
            .collect();

        for entry in &drained {
            entry.handle.abort();
        }
        if !drained.is_empty() {
            tracing::info!("Cancelled {} background tasks", drained.len());
        }
        drained.len()
    }

    /// Snapshot of running tasks, oldest first
    pub fn list(&self) -> Vec<TaskInfo> {
        let mut infos: Vec<TaskInfo> = self
            .inner
            .tasks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|entry| entry.info.clone())
            .collect();
        infos.sort_by(|a, b| a.started_at.cmp(&b.started_at).then_with(|| a.name.cmp(&b.name)));
        infos
    }

    pub fn list_for_session(&self, session: SessionId) -> Vec<TaskInfo> {
        self.list()
            .into_iter()
            .filter(|info| info.session == Some(session))
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<TaskInfo> {
        self.inner
            .tasks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .map(|entry| entry.info.clone())
    }

    pub fn len(&self) -> usize {
        self.inner.tasks.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Receive completion and cancellation events
    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.inner.events.subscribe()
    }
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TaskRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskRegistry").field("tasks", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn sleeper(secs: u64) -> impl Future<Output = Option<String>> {
        async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            Some("done".to_string())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_completed_task_removes_itself_and_notifies() {
        let registry = TaskRegistry::new();
        let mut events = registry.subscribe();
        registry.spawn(TaskInfo::new("t1", "timer", "one second"), sleeper(1));
        assert_eq!(registry.len(), 1);

        match events.recv().await.unwrap() {
            TaskEvent::Completed { info, message } => {
                assert_eq!(info.name, "t1");
                assert_eq!(message.as_deref(), Some("done"));
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert!(registry.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_aborts_task() {
        let registry = TaskRegistry::new();
        let mut events = registry.subscribe();
        registry.spawn(TaskInfo::new("t1", "timer", "long"), sleeper(3600));

        assert!(registry.cancel("t1"));
        assert!(!registry.cancel("t1"));
        assert!(matches!(events.recv().await.unwrap(), TaskEvent::Cancelled { .. }));

        tokio::time::sleep(Duration::from_secs(7200)).await;
        assert!(events.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_replacing_name_keeps_newest() {
        let registry = TaskRegistry::new();
        registry.spawn(TaskInfo::new("t", "timer", "first"), sleeper(10));
        registry.spawn(TaskInfo::new("t", "timer", "second"), sleeper(20));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("t").unwrap().description, "second");

        tokio::time::sleep(Duration::from_secs(15)).await;
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_list_for_session_filters() {
        let registry = TaskRegistry::new();
        let mine = SessionId::new();
        let theirs = SessionId::new();
        registry.spawn(TaskInfo::new("a", "timer", "").for_session(mine), sleeper(60));
        registry.spawn(TaskInfo::new("b", "timer", "").for_session(theirs), sleeper(60));
        registry.spawn(TaskInfo::new("c", "timer", ""), sleeper(60));

        let names: Vec<_> = registry.list_for_session(mine).into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["a"]);
        assert_eq!(registry.cancel_all(), 3);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remaining_never_negative() {
        let info = TaskInfo::new("t", "timer", "").due_in(chrono::Duration::seconds(30));
        let later = info.started_at + chrono::Duration::seconds(45);
        assert_eq!(info.remaining(later), Some(chrono::Duration::zero()));
        assert_eq!(info.remaining(info.started_at), Some(chrono::Duration::seconds(30)));
    }
}
