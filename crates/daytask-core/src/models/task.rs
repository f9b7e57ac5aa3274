//! Task model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::{Entity, EntityId, EntityKind, Notification, OwnerId, Record};
use crate::error::{Error, Result};
use crate::util::next_stamp;

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

/// Recurrence rule, kept as metadata only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    Daily,
    Weekly,
    Monthly,
}

/// A task in the system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier
    pub id: EntityId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub labels: Option<Vec<String>>,
    #[serde(default)]
    pub recurrence: Option<Recurrence>,
    #[serde(default)]
    pub reminder: Option<DateTime<Utc>>,
    #[serde(default)]
    pub snoozed_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Last modification, used for last-write-wins
    pub updated_at: DateTime<Utc>,
    /// `None` while the task belongs to a guest
    #[serde(default, rename = "userId")]
    pub owner_id: Option<OwnerId>,
}

impl Task {
    /// Flip completion, keeping `completed_at` consistent with the flag.
    pub fn set_completed(&mut self, completed: bool, now: DateTime<Utc>) {
        if completed == self.completed {
            return;
        }
        self.completed = completed;
        self.completed_at = completed.then_some(now);
    }

    /// Whether the task is hidden by a snooze at `now`
    #[must_use]
    pub fn is_snoozed(&self, now: DateTime<Utc>) -> bool {
        self.snoozed_until.is_some_and(|until| until > now)
    }
}

impl Record for Task {
    const TABLE: &'static str = EntityKind::Task.table();

    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl Entity for Task {
    const KIND: EntityKind = EntityKind::Task;
    type Draft = TaskDraft;

    fn from_draft(
        draft: TaskDraft,
        id: EntityId,
        owner: Option<OwnerId>,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let title = validate_title(&draft.title)?;
        Ok(Self {
            id,
            title,
            description: draft.description.unwrap_or_default(),
            completed: false,
            completed_at: None,
            due_date: draft.due_date,
            priority: draft.priority.unwrap_or_default(),
            labels: normalize_labels(draft.labels),
            recurrence: draft.recurrence,
            reminder: draft.reminder,
            snoozed_until: draft.snoozed_until,
            created_at: now,
            updated_at: now,
            owner_id: owner,
        })
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = next_stamp(self.updated_at, now);
    }

    fn owner_id(&self) -> Option<&OwnerId> {
        self.owner_id.as_ref()
    }

    fn set_owner_id(&mut self, owner: OwnerId) {
        self.owner_id = Some(owner);
    }

    fn reminder(&self) -> Option<(DateTime<Utc>, Notification)> {
        let at = self.reminder?;
        let notification = Notification::new(
            "Task Reminder",
            format!("Reminder for task: {}", self.title),
            Some(self.id.clone()),
        );
        Some((at, notification))
    }
}

/// Input for creating a task. Only the title is required.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Option<Priority>,
    pub labels: Vec<String>,
    pub recurrence: Option<Recurrence>,
    pub reminder: Option<DateTime<Utc>>,
    pub snoozed_until: Option<DateTime<Utc>>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Edit of an existing task.
///
/// `None` leaves a field alone; for clearable fields `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub priority: Option<Priority>,
    pub labels: Option<Vec<String>>,
    pub recurrence: Option<Option<Recurrence>>,
    pub reminder: Option<Option<DateTime<Utc>>>,
    pub snoozed_until: Option<Option<DateTime<Utc>>>,
}

impl TaskPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Apply the patch. Validation happens before anything is written.
    pub fn apply(self, task: &mut Task, now: DateTime<Utc>) -> Result<()> {
        let title = self.title.as_deref().map(validate_title).transpose()?;

        if let Some(title) = title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(completed) = self.completed {
            task.set_completed(completed, now);
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(labels) = self.labels {
            task.labels = normalize_labels(labels);
        }
        if let Some(recurrence) = self.recurrence {
            task.recurrence = recurrence;
        }
        if let Some(reminder) = self.reminder {
            task.reminder = reminder;
        }
        if let Some(snoozed_until) = self.snoozed_until {
            task.snoozed_until = snoozed_until;
        }
        Ok(())
    }
}

fn validate_title(raw: &str) -> Result<String> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(Error::InvalidInput("Task title cannot be empty".to_string()));
    }
    Ok(title.to_string())
}

/// Trim, drop blanks and deduplicate; an empty set is stored as `None`.
fn normalize_labels(labels: Vec<String>) -> Option<Vec<String>> {
    let set = labels
        .into_iter()
        .map(|label| label.trim().to_string())
        .filter(|label| !label.is_empty())
        .collect::<BTreeSet<_>>();
    if set.is_empty() {
        None
    } else {
        Some(set.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn at(raw: &str) -> DateTime<Utc> {
        raw.parse().unwrap()
    }

    fn sample() -> Task {
        Task::from_draft(
            TaskDraft::new("Write report"),
            "t1".parse().unwrap(),
            None,
            at("2025-01-01T00:00:00Z"),
        )
        .unwrap()
    }

    #[test]
    fn test_from_draft_applies_defaults() {
        let task = sample();
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.description, "");
        assert!(!task.completed);
        assert_eq!(task.created_at, task.updated_at);
        assert!(task.owner_id.is_none());
        assert!(task.labels.is_none());
    }

    #[test]
    fn test_from_draft_rejects_blank_title() {
        let result = Task::from_draft(
            TaskDraft::new("   "),
            EntityId::new(),
            None,
            Utc::now(),
        );
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_labels_are_normalized() {
        let draft = TaskDraft {
            labels: vec![" work ".into(), "home".into(), "work".into(), " ".into()],
            ..TaskDraft::new("Sort labels")
        };
        let task = Task::from_draft(draft, EntityId::new(), None, Utc::now()).unwrap();
        assert_eq!(
            task.labels,
            Some(vec!["home".to_string(), "work".to_string()])
        );
    }

    #[test]
    fn test_touch_is_monotonic() {
        let mut task = sample();
        task.touch(at("2024-12-31T00:00:00Z"));
        assert_eq!(task.updated_at, at("2025-01-01T00:00:00Z"));
        task.touch(at("2025-01-02T00:00:00Z"));
        assert_eq!(task.updated_at, at("2025-01-02T00:00:00Z"));
    }

    #[test]
    fn test_patch_completion_sets_completed_at() {
        let mut task = sample();
        let now = at("2025-01-05T08:00:00Z");
        TaskPatch {
            completed: Some(true),
            ..TaskPatch::default()
        }
        .apply(&mut task, now)
        .unwrap();
        assert!(task.completed);
        assert_eq!(task.completed_at, Some(now));

        TaskPatch {
            completed: Some(false),
            ..TaskPatch::default()
        }
        .apply(&mut task, now)
        .unwrap();
        assert!(task.completed_at.is_none());
    }

    #[test]
    fn test_patch_clears_optional_fields() {
        let mut task = sample();
        task.reminder = Some(at("2025-01-03T09:00:00Z"));
        TaskPatch {
            reminder: Some(None),
            priority: Some(Priority::High),
            ..TaskPatch::default()
        }
        .apply(&mut task, Utc::now())
        .unwrap();
        assert!(task.reminder.is_none());
        assert_eq!(task.priority, Priority::High);
    }

    #[test]
    fn test_invalid_patch_leaves_task_untouched() {
        let mut task = sample();
        let before = task.clone();
        let result = TaskPatch {
            title: Some(String::new()),
            completed: Some(true),
            ..TaskPatch::default()
        }
        .apply(&mut task, Utc::now());
        assert!(result.is_err());
        assert_eq!(task, before);
    }

    #[test]
    fn test_wire_format_uses_user_id() {
        let mut task = sample();
        task.set_owner_id("u1".parse().unwrap());
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["updatedAt"], "2025-01-01T00:00:00Z");
        assert_eq!(json["priority"], "medium");

        let back: Task = serde_json::from_value(json).unwrap();
        assert_eq!(back, task);
    }

    #[test]
    fn test_reminder_notification_references_task() {
        let mut task = sample();
        task.reminder = Some(at("2025-01-02T07:00:00Z"));
        let (when, notification) = task.reminder().unwrap();
        assert_eq!(when, at("2025-01-02T07:00:00Z"));
        assert_eq!(notification.task_id, Some(task.id.clone()));
        assert!(notification.message.contains("Write report"));
    }
}
