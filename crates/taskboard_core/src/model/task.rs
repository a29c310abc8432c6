//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical task record and its priority vocabulary.
//! - Provide field validators shared by the form layer and the repository.
//! - Provide tombstone helpers for soft-delete semantics.
//!
//! # Invariants
//! - `title.trim()` is never empty for a persisted task.
//! - `deleted_at.is_some() == is_deleted` at all times.
//! - `priority` is one of `High`, `Medium`, `Low`; the storage triggers
//!   accept exactly the strings returned by [`Priority::as_str`].

use crate::model::category::CategoryId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Stable task identifier.
pub type TaskId = Uuid;

/// Task urgency.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    /// Storage and wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = TaskValidationError;

    /// Exact, case-sensitive match, mirroring the storage trigger.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Priority::ALL
            .into_iter()
            .find(|priority| priority.as_str() == value)
            .ok_or_else(|| TaskValidationError::InvalidPriority(value.to_string()))
    }
}

/// Field-level invariant violations for tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    /// Title is empty after trimming whitespace.
    EmptyTitle,
    /// Due date lies before the caller's local `today`.
    PastDueDate { due_date: NaiveDate, today: NaiveDate },
    /// Priority is not one of `High`, `Medium`, `Low`.
    InvalidPriority(String),
    NilId,
    /// `is_deleted` and `deleted_at` disagree.
    TombstoneMismatch { is_deleted: bool },
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "task title cannot be empty"),
            Self::PastDueDate { due_date, today } => write!(
                f,
                "due date {due_date} cannot be earlier than today ({today})"
            ),
            Self::InvalidPriority(value) => write!(
                f,
                "invalid priority `{value}`; expected High, Medium or Low"
            ),
            Self::NilId => write!(f, "task id cannot be nil"),
            Self::TombstoneMismatch { is_deleted } => write!(
                f,
                "deleted_at must be set iff is_deleted is true (is_deleted={is_deleted})"
            ),
        }
    }
}

impl Error for TaskValidationError {}

/// Trims `raw` and rejects an empty result.
pub fn validate_title(raw: &str) -> Result<String, TaskValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TaskValidationError::EmptyTitle);
    }
    Ok(trimmed.to_string())
}

/// Rejects a due date earlier than `today`. `today` itself is accepted.
pub fn validate_due_date(
    due_date: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<Option<NaiveDate>, TaskValidationError> {
    match due_date {
        Some(due_date) if due_date < today => {
            Err(TaskValidationError::PastDueDate { due_date, today })
        }
        other => Ok(other),
    }
}

/// User-editable task fields, as accepted by create and edit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
    pub category_id: Option<CategoryId>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Canonical task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
    /// Weak reference; cleared when the category is deleted.
    pub category_id: Option<CategoryId>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Creates an alive, incomplete, medium-priority task with a fresh id.
    pub fn new(title: impl Into<String>) -> Self {
        Self::from_draft(TaskDraft::new(title))
    }

    /// Creates an alive, incomplete task from cleaned input with a fresh id.
    pub fn from_draft(draft: TaskDraft) -> Self {
        Self::from_parts(Uuid::new_v4(), draft)
    }

    /// Creates a task with a caller-provided id, used by import paths and
    /// tests that need deterministic ids.
    pub fn with_id(id: TaskId, title: impl Into<String>) -> Result<Self, TaskValidationError> {
        if id.is_nil() {
            return Err(TaskValidationError::NilId);
        }
        Ok(Self::from_parts(id, TaskDraft::new(title)))
    }

    fn from_parts(id: TaskId, draft: TaskDraft) -> Self {
        Self {
            id,
            title: draft.title,
            description: draft.description,
            completed: false,
            due_date: draft.due_date,
            priority: draft.priority,
            category_id: draft.category_id,
            is_deleted: false,
            deleted_at: None,
        }
    }

    /// Copies the user-editable fields out of this task.
    pub fn to_draft(&self) -> TaskDraft {
        TaskDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            due_date: self.due_date,
            priority: self.priority,
            category_id: self.category_id,
        }
    }

    /// Tombstones the task. Returns `false` when it was already deleted,
    /// in which case `deleted_at` keeps its original value.
    pub fn soft_delete(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_deleted {
            return false;
        }
        self.is_deleted = true;
        self.deleted_at = Some(now);
        true
    }

    /// Clears the tombstone. Returns `false` when the task was alive.
    pub fn restore(&mut self) -> bool {
        if !self.is_deleted {
            return false;
        }
        self.is_deleted = false;
        self.deleted_at = None;
        true
    }

    /// Plain `delete` on a task is a soft delete; physical removal only
    /// happens through the repository's `hard_delete_task`.
    pub fn delete(&mut self, now: DateTime<Utc>) -> bool {
        self.soft_delete(now)
    }

    pub fn is_active(&self) -> bool {
        !self.is_deleted
    }

    /// Incomplete and due strictly before `today`.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.completed && self.due_date.is_some_and(|due_date| due_date < today)
    }

    /// Checks invariants that must hold for every persisted task.
    ///
    /// Due dates are not checked here: a stored task legitimately becomes
    /// overdue as time passes.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.id.is_nil() {
            return Err(TaskValidationError::NilId);
        }
        validate_title(&self.title)?;
        if self.is_deleted != self.deleted_at.is_some() {
            return Err(TaskValidationError::TombstoneMismatch {
                is_deleted: self.is_deleted,
            });
        }
        Ok(())
    }
}

/// Task row joined with its category name, as shown in lists and trash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskListItem {
    #[serde(flatten)]
    pub task: Task,
    pub category_name: Option<String>,
}
