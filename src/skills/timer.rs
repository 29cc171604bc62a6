//! Countdown timers backed by the background task registry

use crate::context::state::ContextState;
use crate::context::tasks::{TaskInfo, TaskRegistry};
use crate::core::error::{Result, ZeroError};
use crate::core::types::{kinds, EntitySet};
use crate::skills::{Skill, SkillResponse};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

pub const TIMER_KIND: &str = "timer";

/// Longest timer accepted (one day)
const MAX_TIMER_SECONDS: i64 = 24 * 60 * 60;

pub struct TimerSkill {
    tasks: TaskRegistry,
    next_id: AtomicU64,
}

impl TimerSkill {
    pub fn new(tasks: TaskRegistry) -> Self {
        Self {
            tasks,
            next_id: AtomicU64::new(1),
        }
    }

    fn duration_seconds(entities: &EntitySet) -> Option<i64> {
        entities
            .value(kinds::DURATION)
            .and_then(|v| v.as_i64())
            .filter(|secs| (1..=MAX_TIMER_SECONDS).contains(secs))
    }

    /// Timers visible to the requesting session
    fn session_timers(&self, context: &ContextState) -> Vec<TaskInfo> {
        let timers = match context.session {
            Some(session) => self.tasks.list_for_session(session),
            None => self.tasks.list(),
        };
        timers.into_iter().filter(|t| t.kind == TIMER_KIND).collect()
    }

    fn set(&self, entities: &EntitySet, context: &ContextState) -> Result<SkillResponse> {
        let seconds = Self::duration_seconds(entities)
            .ok_or_else(|| ZeroError::execution(self.name(), "duration missing or out of range"))?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let name = format!("timer-{}", id);
        let label = humanize_seconds(seconds);

        let mut info = TaskInfo::new(&name, TIMER_KIND, format!("{} timer", label))
            .due_in(chrono::Duration::seconds(seconds));
        if let Some(session) = context.session {
            info = info.for_session(session);
        }

        let done_message = format!("Your {} timer is done!", label);
        self.tasks.spawn(info, async move {
            tokio::time::sleep(Duration::from_secs(seconds.unsigned_abs())).await;
            Some(done_message)
        });

        Ok(SkillResponse::success(format!("Timer set for {}.", label))
            .with_data("timer", name)
            .with_data("duration_seconds", seconds))
    }

    fn cancel(&self, context: &ContextState) -> SkillResponse {
        let timers = self.session_timers(context);
        if timers.is_empty() {
            return SkillResponse::success("You don't have any timers running.");
        }

        let cancelled = timers.iter().filter(|t| self.tasks.cancel(&t.name)).count();
        let message = if cancelled == 1 {
            "Timer cancelled.".to_string()
        } else {
            format!("Cancelled {} timers.", cancelled)
        };
        SkillResponse::success(message).with_data("cancelled", cancelled)
    }

    fn list(&self, context: &ContextState) -> SkillResponse {
        let timers = self.session_timers(context);
        if timers.is_empty() {
            return SkillResponse::success("You don't have any timers running.");
        }

        let now = Utc::now();
        let lines: Vec<String> = timers
            .iter()
            .map(|t| {
                let left = t.remaining(now).map_or(0, |d| d.num_seconds());
                format!("{} with {} left", t.description, humanize_seconds(left))
            })
            .collect();
        let names: Vec<&str> = timers.iter().map(|t| t.name.as_str()).collect();

        SkillResponse::success(format!(
            "You have {}: {}.",
            plural(timers.len(), "timer"),
            lines.join("; ")
        ))
        .with_data("timers", names)
    }

    fn status(&self, context: &ContextState) -> SkillResponse {
        let now = Utc::now();
        let soonest = self
            .session_timers(context)
            .into_iter()
            .filter_map(|t| t.remaining(now).map(|left| (left, t)))
            .min_by_key(|(left, _)| *left);

        match soonest {
            Some((left, timer)) => SkillResponse::success(format!(
                "{} left on your {}.",
                humanize_seconds(left.num_seconds()),
                timer.description
            ))
            .with_data("remaining_seconds", left.num_seconds()),
            None => SkillResponse::success("You don't have any timers running."),
        }
    }
}

#[async_trait]
impl Skill for TimerSkill {
    fn name(&self) -> &str {
        "timer"
    }

    fn description(&self) -> &str {
        "Set, list, check and cancel countdown timers"
    }

    fn supported_intents(&self) -> Vec<String> {
        ["timer.set", "timer.cancel", "timer.list", "timer.status"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn validate(&self, intent: &str, entities: &EntitySet) -> bool {
        intent != "timer.set" || Self::duration_seconds(entities).is_some()
    }

    async fn execute(
        &self,
        intent: &str,
        entities: &EntitySet,
        context: &ContextState,
    ) -> Result<SkillResponse> {
        match intent {
            "timer.set" => self.set(entities, context),
            "timer.cancel" => Ok(self.cancel(context)),
            "timer.list" => Ok(self.list(context)),
            "timer.status" => Ok(self.status(context)),
            other => Err(ZeroError::execution(
                self.name(),
                format!("unsupported intent {}", other),
            )),
        }
    }

    async fn cleanup(&self) {
        for timer in self.tasks.list().into_iter().filter(|t| t.kind == TIMER_KIND) {
            self.tasks.cancel(&timer.name);
        }
    }
}

/// "1 hour 30 minutes", "45 seconds"
pub fn humanize_seconds(total: i64) -> String {
    let total = total.max(0);
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);

    let parts: Vec<String> = [(hours, "hour"), (minutes, "minute"), (seconds, "second")]
        .iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, unit)| plural(*n as usize, unit))
        .collect();

    if parts.is_empty() {
        "0 seconds".to_string()
    } else {
        parts.join(" ")
    }
}

fn plural(n: usize, unit: &str) -> String {
    if n == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", n, unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tasks::TaskEvent;
    use crate::core::types::{Entity, SessionId};

    fn duration(seconds: i64) -> EntitySet {
        let mut entities = EntitySet::new();
        entities.push(Entity::new(kinds::DURATION, seconds, "", 0.95));
        entities
    }

    fn session_context() -> ContextState {
        ContextState {
            session: Some(SessionId::new()),
            ..ContextState::default()
        }
    }

    #[test]
    fn test_humanize_seconds() {
        assert_eq!(humanize_seconds(5400), "1 hour 30 minutes");
        assert_eq!(humanize_seconds(300), "5 minutes");
        assert_eq!(humanize_seconds(61), "1 minute 1 second");
        assert_eq!(humanize_seconds(0), "0 seconds");
    }

    #[test]
    fn test_validate_requires_positive_duration_for_set() {
        let skill = TimerSkill::new(TaskRegistry::new());
        assert!(!skill.validate("timer.set", &EntitySet::new()));
        assert!(!skill.validate("timer.set", &duration(0)));
        assert!(skill.validate("timer.set", &duration(300)));
        assert!(skill.validate("timer.cancel", &EntitySet::new()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_runs_to_completion() {
        let tasks = TaskRegistry::new();
        let mut events = tasks.subscribe();
        let skill = TimerSkill::new(tasks.clone());
        let context = session_context();

        let response = skill.execute("timer.set", &duration(300), &context).await.unwrap();
        assert!(response.success);
        assert_eq!(response.message, "Timer set for 5 minutes.");
        assert_eq!(response.data["duration_seconds"], 300);
        assert_eq!(tasks.list_for_session(context.session.unwrap()).len(), 1);

        match events.recv().await.unwrap() {
            TaskEvent::Completed { message, .. } => {
                assert_eq!(message.as_deref(), Some("Your 5 minutes timer is done!"));
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert!(tasks.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_only_touches_own_session() {
        let tasks = TaskRegistry::new();
        let skill = TimerSkill::new(tasks.clone());
        let mine = session_context();
        let theirs = session_context();

        skill.execute("timer.set", &duration(60), &mine).await.unwrap();
        skill.execute("timer.set", &duration(60), &theirs).await.unwrap();

        let response = skill.execute("timer.cancel", &EntitySet::new(), &mine).await.unwrap();
        assert_eq!(response.message, "Timer cancelled.");
        assert_eq!(tasks.len(), 1);

        let response = skill.execute("timer.list", &EntitySet::new(), &mine).await.unwrap();
        assert_eq!(response.message, "You don't have any timers running.");
    }

    #[tokio::test(start_paused = true)]
    async fn test_list_and_status() {
        let tasks = TaskRegistry::new();
        let skill = TimerSkill::new(tasks);
        let context = session_context();
        skill.execute("timer.set", &duration(600), &context).await.unwrap();

        let list = skill.execute("timer.list", &EntitySet::new(), &context).await.unwrap();
        assert!(list.message.starts_with("You have 1 timer: 10 minutes timer"));

        let status = skill.execute("timer.status", &EntitySet::new(), &context).await.unwrap();
        assert!(status.message.ends_with("left on your 10 minutes timer."));
    }
}
