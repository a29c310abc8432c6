//! Core domain logic for Taskboard.
//! This crate is the single source of truth for task invariants.

pub mod constraint;
pub mod db;
pub mod forms;
pub mod logging;
pub mod model;
pub mod report;
pub mod repo;
pub mod service;

pub use constraint::{ConstraintCode, ConstraintViolation};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use forms::{FormError, FormErrors, FormField, TaskForm};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::category::{Category, CategoryId};
pub use model::task::{Priority, Task, TaskDraft, TaskId, TaskListItem, TaskValidationError};
pub use report::combined::{CombinedQuery, ProjectedTask, SetOperation};
pub use report::stats::{ChartData, TaskStats};
pub use report::{ReportError, ReportResult};
pub use repo::category_repo::{CategoryRepository, SqliteCategoryRepository};
pub use repo::task_repo::{
    SqliteTaskRepository, StatusFilter, TaskListQuery, TaskRepository, TaskView,
};
pub use repo::{RepoError, RepoResult};
pub use service::task_service::{SubmitOutcome, TaskService, TaskServiceError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
