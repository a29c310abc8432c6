//! Category domain model.
//!
//! Categories are weak owners: deleting one detaches its tasks instead of
//! deleting them. Categories are never soft-deleted.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type CategoryId = Uuid;

/// Categories created on first task-list access, as `(name, description)`.
pub const DEFAULT_CATEGORIES: &[(&str, &str)] = &[
    ("Work", "Tasks related to work"),
    ("Personal", "Personal and household tasks"),
    ("Study", "Tasks related to studies"),
    ("Other", "Tasks that fit nowhere else"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryValidationError {
    EmptyName,
}

impl Display for CategoryValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "category name cannot be empty"),
        }
    }
}

impl Error for CategoryValidationError {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    /// Unique across the store; trimmed on construction.
    pub name: String,
    pub description: String,
}

impl Category {
    /// Builds a category with a fresh id, trimming the name.
    pub fn new(
        name: impl AsRef<str>,
        description: impl Into<String>,
    ) -> Result<Self, CategoryValidationError> {
        let name = name.as_ref().trim();
        if name.is_empty() {
            return Err(CategoryValidationError::EmptyName);
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: description.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Category, CategoryValidationError, DEFAULT_CATEGORIES};

    #[test]
    fn new_trims_name() {
        let category = Category::new("  Errands ", "").unwrap();
        assert_eq!(category.name, "Errands");
    }

    #[test]
    fn new_rejects_blank_name() {
        assert_eq!(
            Category::new(" \t", "x").unwrap_err(),
            CategoryValidationError::EmptyName
        );
    }

    #[test]
    fn default_names_are_unique() {
        let mut names: Vec<_> = DEFAULT_CATEGORIES.iter().map(|(name, _)| *name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), DEFAULT_CATEGORIES.len());
    }
}
