//! Classification of storage-layer constraint violations.
//!
//! The `tasks` triggers repeat the form rules. When a write slips past the
//! form (for example a date that became past between cleaning and saving),
//! SQLite aborts the statement and this module decides which form field the
//! rejection belongs to.
//!
//! # Invariants
//! - Trigger messages of the form `task_<code>: <text>` are classified by
//!   their code alone.
//! - Untagged messages fall back to word matching on `due date`/`date`,
//!   `priority`, `title`, checked in that order. This fallback is a known
//!   weak spot: any constraint text that happens to contain one of those
//!   words is attributed to that field.
//! - Anything else is `Unclassified` and becomes a general form error.

use crate::forms::{FormErrors, FormField};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::ErrorCode;
use serde::Serialize;
use std::fmt::{Display, Formatter};

static CODE_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(task_[a-z_]+):").expect("valid constraint code regex"));
static DUE_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:due[ _]date|date)\b").expect("valid due date regex"));
static PRIORITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bpriority\b").expect("valid priority regex"));
static TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\btitle\b").expect("valid title regex"));

/// Which task rule the store rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintCode {
    EmptyTitle,
    InvalidPriority,
    PastDueDate,
    Unclassified,
}

impl ConstraintCode {
    fn from_trigger_code(code: &str) -> Option<Self> {
        match code {
            "task_empty_title" => Some(Self::EmptyTitle),
            "task_invalid_priority" => Some(Self::InvalidPriority),
            "task_past_due_date" => Some(Self::PastDueDate),
            _ => None,
        }
    }

    /// Form field that owns this rejection, if any.
    pub fn field(self) -> Option<FormField> {
        match self {
            Self::EmptyTitle => Some(FormField::Title),
            Self::InvalidPriority => Some(FormField::Priority),
            Self::PastDueDate => Some(FormField::DueDate),
            Self::Unclassified => None,
        }
    }

    fn form_code(self) -> &'static str {
        match self {
            Self::EmptyTitle => "empty_title",
            Self::InvalidPriority => "invalid_priority",
            Self::PastDueDate => "past_due_date",
            Self::Unclassified => "storage_constraint",
        }
    }

    fn form_message(self) -> &'static str {
        match self {
            Self::EmptyTitle => "Task title cannot be empty (rejected by the task store).",
            Self::InvalidPriority => {
                "Invalid priority; must be High, Medium or Low (rejected by the task store)."
            }
            Self::PastDueDate => {
                "Due date cannot be earlier than today (rejected by the task store)."
            }
            Self::Unclassified => "The task could not be saved because of a storage constraint.",
        }
    }
}

/// A constraint rejection reported by SQLite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintViolation {
    pub code: ConstraintCode,
    /// Raw SQLite message.
    pub message: String,
    /// `true` when `code` came from a `task_*` prefix rather than word matching.
    pub structured: bool,
}

impl ConstraintViolation {
    /// Extracts a violation from a rusqlite error, if it is one.
    pub fn from_sqlite(err: &rusqlite::Error) -> Option<Self> {
        match err {
            rusqlite::Error::SqliteFailure(failure, message)
                if failure.code == ErrorCode::ConstraintViolation =>
            {
                Some(classify_message(message.as_deref().unwrap_or_default()))
            }
            _ => None,
        }
    }

    /// Re-surfaces this rejection as a field (or general) form error.
    pub fn apply_to(&self, errors: &mut FormErrors) {
        errors.add_error(
            self.code.field(),
            self.code.form_code(),
            self.code.form_message(),
        );
    }
}

impl Display for ConstraintViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "constraint violation: {}", self.message)
    }
}

/// Classifies a raw constraint message.
pub fn classify_message(message: &str) -> ConstraintViolation {
    let structured = CODE_PREFIX_RE
        .captures(message)
        .and_then(|caps| caps.get(1))
        .and_then(|code| ConstraintCode::from_trigger_code(code.as_str()));

    let (code, structured) = match structured {
        Some(code) => (code, true),
        None => (classify_by_words(message), false),
    };

    ConstraintViolation {
        code,
        message: message.to_string(),
        structured,
    }
}

fn classify_by_words(message: &str) -> ConstraintCode {
    if DUE_DATE_RE.is_match(message) {
        ConstraintCode::PastDueDate
    } else if PRIORITY_RE.is_match(message) {
        ConstraintCode::InvalidPriority
    } else if TITLE_RE.is_match(message) {
        ConstraintCode::EmptyTitle
    } else {
        ConstraintCode::Unclassified
    }
}
