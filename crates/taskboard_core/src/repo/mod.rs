//! Repository layer: data access contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define use-case oriented persistence contracts for tasks and categories.
//! - Keep SQL details out of the service layer.
//! - Translate SQLite constraint aborts into [`RepoError::Constraint`].
//!
//! # Invariants
//! - Repositories only accept connections migrated to the latest schema.
//! - Task queries take an explicit [`task_repo::TaskView`]; nothing relies
//!   on a hidden default filter.

use crate::constraint::ConstraintViolation;
use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::category::CategoryValidationError;
use crate::model::task::TaskValidationError;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod category_repo;
pub mod task_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for task and category persistence.
#[derive(Debug)]
pub enum RepoError {
    /// Task failed model validation before reaching SQL.
    Validation(TaskValidationError),
    /// Category failed model validation before reaching SQL.
    CategoryValidation(CategoryValidationError),
    /// SQLite rejected the write with a constraint or trigger abort.
    Constraint(ConstraintViolation),
    Db(DbError),
    NotFound {
        entity: &'static str,
        id: Uuid,
    },
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    /// Persisted row cannot be converted into a valid model.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::CategoryValidation(err) => write!(f, "{err}"),
            Self::Constraint(violation) => write!(f, "{violation}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::CategoryValidation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TaskValidationError> for RepoError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<CategoryValidationError> for RepoError {
    fn from(value: CategoryValidationError) -> Self {
        Self::CategoryValidation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Sqlite(err) => err.into(),
            other => Self::Db(other),
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        match ConstraintViolation::from_sqlite(&value) {
            Some(violation) => Self::Constraint(violation),
            None => Self::Db(DbError::Sqlite(value)),
        }
    }
}

/// Verifies schema version and required tables before a repository uses
/// the connection.
pub(crate) fn ensure_connection_ready(
    conn: &Connection,
    required_tables: &[&'static str],
) -> RepoResult<()> {
    let actual_version = current_user_version(conn)?;
    let expected_version = latest_version();
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for &table in required_tables {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}
