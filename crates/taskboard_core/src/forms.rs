//! Task input form: raw submitted strings, cleaning, and field errors.
//!
//! # Responsibility
//! - Turn raw user input into a [`TaskDraft`] or a set of [`FormErrors`].
//! - Give storage-layer rejections the same field-error shape as input
//!   rejections (see [`crate::constraint`]).
//!
//! # Invariants
//! - Cleaning never touches storage; category existence is checked by the
//!   service before saving.
//! - A form with errors is never saved.

use crate::model::category::CategoryId;
use crate::model::task::{
    validate_due_date, validate_title, Priority, Task, TaskDraft, TaskValidationError,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Input fields of the task form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormField {
    Title,
    Description,
    DueDate,
    Priority,
    Category,
}

/// One rejection reason with a stable machine-readable code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormError {
    pub code: &'static str,
    pub message: String,
}

/// Field-level and general errors collected while cleaning or saving.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormErrors {
    fields: BTreeMap<FormField, Vec<FormError>>,
    general: Vec<FormError>,
}

impl FormErrors {
    /// Attaches an error to `field`, or to the general list when `None`.
    pub fn add_error(
        &mut self,
        field: Option<FormField>,
        code: &'static str,
        message: impl Into<String>,
    ) {
        let error = FormError {
            code,
            message: message.into(),
        };
        match field {
            Some(field) => self.fields.entry(field).or_default().push(error),
            None => self.general.push(error),
        }
    }

    pub fn add_validation_error(&mut self, error: &TaskValidationError) {
        let (field, code) = match error {
            TaskValidationError::EmptyTitle => (Some(FormField::Title), "empty_title"),
            TaskValidationError::PastDueDate { .. } => (Some(FormField::DueDate), "past_due_date"),
            TaskValidationError::InvalidPriority(_) => {
                (Some(FormField::Priority), "invalid_priority")
            }
            TaskValidationError::NilId | TaskValidationError::TombstoneMismatch { .. } => {
                (None, "invalid_task")
            }
        };
        self.add_error(field, code, error.to_string());
    }

    pub fn field(&self, field: FormField) -> &[FormError] {
        self.fields.get(&field).map_or(&[], Vec::as_slice)
    }

    /// Whether `field` carries an error with the given code.
    pub fn has(&self, field: FormField, code: &str) -> bool {
        self.field(field).iter().any(|error| error.code == code)
    }

    pub fn general(&self) -> &[FormError] {
        &self.general
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.general.is_empty()
    }
}

/// Raw form submission. Empty strings mean "not provided".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskForm {
    pub title: String,
    pub description: String,
    pub due_date: String,
    pub priority: String,
    pub category: String,
}

impl TaskForm {
    /// Pre-fills a form from a stored task, as shown by the edit page.
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            due_date: task
                .due_date
                .map(|date| date.format(DATE_FORMAT).to_string())
                .unwrap_or_default(),
            priority: task.priority.as_str().to_string(),
            category: task
                .category_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
        }
    }

    /// Validates every field against `today` and collects all failures.
    pub fn clean(&self, today: NaiveDate) -> Result<TaskDraft, FormErrors> {
        let mut errors = FormErrors::default();

        let title = validate_title(&self.title)
            .map_err(|err| errors.add_validation_error(&err))
            .ok();

        let description = Some(self.description.trim())
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        let due_date = match parse_optional_date(&self.due_date) {
            Ok(parsed) => validate_due_date(parsed, today)
                .map_err(|err| errors.add_validation_error(&err))
                .ok()
                .flatten(),
            Err(()) => {
                errors.add_error(
                    Some(FormField::DueDate),
                    "invalid_date",
                    format!("`{}` is not a valid YYYY-MM-DD date", self.due_date.trim()),
                );
                None
            }
        };

        let priority = match self.priority.trim() {
            "" => Priority::default(),
            value => value.parse::<Priority>().unwrap_or_else(|err| {
                errors.add_validation_error(&err);
                Priority::default()
            }),
        };

        let category_id = match parse_optional_category(&self.category) {
            Ok(category_id) => category_id,
            Err(()) => {
                errors.add_error(
                    Some(FormField::Category),
                    "invalid_category",
                    format!("`{}` is not a valid category id", self.category.trim()),
                );
                None
            }
        };

        match title {
            Some(title) if errors.is_empty() => Ok(TaskDraft {
                title,
                description,
                due_date,
                priority,
                category_id,
            }),
            _ => Err(errors),
        }
    }
}

fn parse_optional_date(raw: &str) -> Result<Option<NaiveDate>, ()> {
    match raw.trim() {
        "" => Ok(None),
        value => NaiveDate::parse_from_str(value, DATE_FORMAT)
            .map(Some)
            .map_err(|_| ()),
    }
}

fn parse_optional_category(raw: &str) -> Result<Option<CategoryId>, ()> {
    match raw.trim() {
        "" => Ok(None),
        value => CategoryId::parse_str(value).map(Some).map_err(|_| ()),
    }
}
