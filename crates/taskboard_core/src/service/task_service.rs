//! Task use-case service.
//!
//! # Responsibility
//! - Provide the task board operations: list, create, edit, complete,
//!   delete, trash, restore, purge, statistics and combined queries.
//! - Run form cleaning before writes and fold storage rejections back into
//!   the same [`FormErrors`] shape.
//!
//! # Invariants
//! - A submission with form errors is never written.
//! - Every ordinary read uses [`TaskView::Alive`]; only trash operations
//!   look at dead rows.
//! - `today` is resolved once per operation, from the fixed date when one
//!   was configured, otherwise from the local clock.

use crate::forms::{FormErrors, FormField, TaskForm, DATE_FORMAT};
use crate::model::category::{Category, CategoryId};
use crate::model::task::{Priority, Task, TaskDraft, TaskId, TaskListItem};
use crate::report::combined::{combined_tasks, CombinedQuery, ProjectedTask, SetOperation};
use crate::report::stats::{task_stats, ChartData, TaskStats};
use crate::report::ReportError;
use crate::repo::category_repo::{CategoryRepository, SqliteCategoryRepository};
use crate::repo::task_repo::{
    SqliteTaskRepository, StatusFilter, TaskListQuery, TaskRepository, TaskView,
};
use crate::repo::{RepoError, RepoResult};
use chrono::{Local, NaiveDate};
use log::{info, warn};
use rusqlite::Connection;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for task board operations.
#[derive(Debug)]
pub enum TaskServiceError {
    TaskNotFound(TaskId),
    CategoryNotFound(CategoryId),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Statistics or combined query failure.
    Report(ReportError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for TaskServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::CategoryNotFound(id) => write!(f, "category not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Report(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent task state: {details}"),
        }
    }
}

impl Error for TaskServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Report(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for TaskServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound {
                entity: "category",
                id,
            } => Self::CategoryNotFound(id),
            RepoError::NotFound { id, .. } => Self::TaskNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<ReportError> for TaskServiceError {
    fn from(value: ReportError) -> Self {
        Self::Report(value)
    }
}

pub type ServiceResult<T> = Result<T, TaskServiceError>;

/// Result of a create or edit submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "data", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// Saved; the caller redirects to the task list.
    Saved(Task),
    /// Not saved; the caller re-renders the form with these errors.
    Rejected(FormErrors),
}

impl SubmitOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved(_))
    }

    pub fn errors(&self) -> Option<&FormErrors> {
        match self {
            Self::Saved(_) => None,
            Self::Rejected(errors) => Some(errors),
        }
    }
}

/// Task list page contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskListPage {
    pub tasks: Vec<TaskListItem>,
    pub categories: Vec<Category>,
    pub selected_category: Option<CategoryId>,
    pub status: &'static str,
}

/// Edit page contents: the stored task and its prefilled form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditPage {
    pub task: Task,
    pub form: TaskForm,
    pub categories: Vec<Category>,
}

/// Statistics page contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsPage {
    pub today: NaiveDate,
    pub stats: TaskStats,
    pub chart: ChartData,
}

/// Combined query page contents with the normalized parameters echoed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CombinedPage {
    pub items: Vec<ProjectedTask>,
    pub operation: SetOperation,
    pub operation_label: &'static str,
    pub priority: Priority,
    pub day: NaiveDate,
    pub day_iso: String,
}

/// Task board facade over one migrated connection.
pub struct TaskService<'conn> {
    conn: &'conn Connection,
    tasks: SqliteTaskRepository<'conn>,
    categories: SqliteCategoryRepository<'conn>,
    fixed_today: Option<NaiveDate>,
}

impl<'conn> TaskService<'conn> {
    /// Creates a service; fails when the connection is not migrated.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        Ok(Self {
            conn,
            tasks: SqliteTaskRepository::try_new(conn)?,
            categories: SqliteCategoryRepository::try_new(conn)?,
            fixed_today: None,
        })
    }

    /// Pins the date used for due-date checks and overdue counts.
    ///
    /// Storage triggers keep using the real local date, so a pinned date in
    /// the past lets a form accept a due date the store then rejects.
    pub fn with_fixed_today(mut self, today: NaiveDate) -> Self {
        self.fixed_today = Some(today);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.fixed_today.unwrap_or_else(|| Local::now().date_naive())
    }

    /// Lists alive tasks, bootstrapping the default categories first.
    pub fn task_list(
        &self,
        status: StatusFilter,
        category_id: Option<CategoryId>,
    ) -> ServiceResult<TaskListPage> {
        let created = self.categories.ensure_default_categories()?;
        if created > 0 {
            info!("event=categories_bootstrap module=service status=ok created={created}");
        }

        let query = TaskListQuery {
            view: TaskView::Alive,
            status,
            category_id,
        };
        Ok(TaskListPage {
            tasks: self.tasks.list_tasks(&query)?,
            categories: self.categories.list_categories()?,
            selected_category: category_id,
            status: status.as_str(),
        })
    }

    /// Cleans and saves a creation form.
    pub fn create_task(&self, form: &TaskForm) -> ServiceResult<SubmitOutcome> {
        let draft = match self.clean_form(form)? {
            Ok(draft) => draft,
            Err(errors) => return Ok(rejected("task_create", errors)),
        };

        let task = Task::from_draft(draft);
        let id = match self.tasks.create_task(&task) {
            Ok(id) => id,
            Err(err) => return save_rejection("task_create", err),
        };

        let saved = self
            .tasks
            .get_task(id, TaskView::Alive)?
            .ok_or(TaskServiceError::InconsistentState(
                "created task not found in read-back",
            ))?;
        info!("event=task_create module=service status=ok task_id={id}");
        Ok(SubmitOutcome::Saved(saved))
    }

    /// Loads an alive task with its prefilled edit form.
    pub fn edit_form(&self, id: TaskId) -> ServiceResult<EditPage> {
        let task = self.alive_task(id)?;
        Ok(EditPage {
            form: TaskForm::from_task(&task),
            task,
            categories: self.categories.list_categories()?,
        })
    }

    /// Cleans and saves an edit form over an alive task.
    pub fn submit_edit(&self, id: TaskId, form: &TaskForm) -> ServiceResult<SubmitOutcome> {
        self.alive_task(id)?;

        let draft = match self.clean_form(form)? {
            Ok(draft) => draft,
            Err(errors) => return Ok(rejected("task_edit", errors)),
        };

        if let Err(err) = self.tasks.update_task(id, &draft) {
            return save_rejection("task_edit", err);
        }

        let saved = self
            .tasks
            .get_task(id, TaskView::Alive)?
            .ok_or(TaskServiceError::InconsistentState(
                "edited task not found in read-back",
            ))?;
        info!("event=task_edit module=service status=ok task_id={id}");
        Ok(SubmitOutcome::Saved(saved))
    }

    /// Marks an alive task complete.
    pub fn complete_task(&self, id: TaskId) -> ServiceResult<()> {
        self.tasks.set_completed(id, true)?;
        info!("event=task_complete module=service status=ok task_id={id}");
        Ok(())
    }

    /// Soft-deletes a task. `Ok(false)` when it was already in the trash.
    pub fn delete_task(&self, id: TaskId) -> ServiceResult<bool> {
        let deleted = self.tasks.soft_delete_task(id)?;
        info!("event=task_delete module=service status=ok task_id={id} changed={deleted}");
        Ok(deleted)
    }

    /// Soft-deletes every alive task matching the filters.
    pub fn delete_matching(
        &self,
        status: StatusFilter,
        category_id: Option<CategoryId>,
    ) -> ServiceResult<usize> {
        let query = TaskListQuery {
            view: TaskView::Alive,
            status,
            category_id,
        };
        let deleted = self.tasks.soft_delete_matching(&query)?;
        info!(
            "event=task_delete_matching module=service status=ok filter={} deleted={deleted}",
            status.as_str()
        );
        Ok(deleted)
    }

    /// Dead tasks, most recently deleted first.
    pub fn trash_list(&self) -> ServiceResult<Vec<TaskListItem>> {
        Ok(self.tasks.list_tasks(&TaskListQuery::in_view(TaskView::Dead))?)
    }

    /// Restores a trashed task. `Ok(false)` when it was alive.
    pub fn restore_task(&self, id: TaskId) -> ServiceResult<bool> {
        let restored = self.tasks.restore_task(id)?;
        info!("event=task_restore module=service status=ok task_id={id} changed={restored}");
        Ok(restored)
    }

    /// Removes a task permanently, alive or dead.
    pub fn hard_delete_task(&self, id: TaskId) -> ServiceResult<()> {
        self.tasks.hard_delete_task(id)?;
        info!("event=task_purge module=service status=ok task_id={id}");
        Ok(())
    }

    /// Removes every dead task permanently.
    pub fn empty_trash(&self) -> ServiceResult<usize> {
        let purged = self
            .tasks
            .hard_delete_matching(&TaskListQuery::in_view(TaskView::Dead))?;
        info!("event=trash_empty module=service status=ok purged={purged}");
        Ok(purged)
    }

    pub fn stats(&self) -> ServiceResult<StatsPage> {
        let today = self.today();
        let stats = task_stats(self.conn, today)?;
        Ok(StatsPage {
            today,
            chart: stats.chart_data(),
            stats,
        })
    }

    /// Runs a combined query from raw `day`, `op` and `prio` parameters.
    pub fn combined(
        &self,
        day: Option<&str>,
        op: Option<&str>,
        prio: Option<&str>,
    ) -> ServiceResult<CombinedPage> {
        let query = CombinedQuery::from_params(day, op, prio, self.today());
        let items = combined_tasks(self.conn, &query)?;
        Ok(CombinedPage {
            items,
            operation: query.operation,
            operation_label: query.operation.label(),
            priority: query.priority,
            day: query.day,
            day_iso: query.day.format(DATE_FORMAT).to_string(),
        })
    }

    pub fn create_category(
        &self,
        name: &str,
        description: impl Into<String>,
    ) -> ServiceResult<Category> {
        let category = Category::new(name, description).map_err(RepoError::from)?;
        let id = self.categories.create_category(&category)?;
        info!("event=category_create module=service status=ok category_id={id}");
        self.categories
            .get_category(id)?
            .ok_or(TaskServiceError::InconsistentState(
                "created category not found in read-back",
            ))
    }

    pub fn list_categories(&self) -> ServiceResult<Vec<Category>> {
        Ok(self.categories.list_categories()?)
    }

    /// Deletes a category; its tasks stay alive without a category.
    pub fn delete_category(&self, id: CategoryId) -> ServiceResult<()> {
        self.categories.delete_category(id)?;
        info!("event=category_delete module=service status=ok category_id={id}");
        Ok(())
    }

    fn alive_task(&self, id: TaskId) -> ServiceResult<Task> {
        self.tasks
            .get_task(id, TaskView::Alive)?
            .ok_or(TaskServiceError::TaskNotFound(id))
    }

    /// Form cleaning plus the category existence check, which needs storage.
    fn clean_form(&self, form: &TaskForm) -> ServiceResult<Result<TaskDraft, FormErrors>> {
        let draft = match form.clean(self.today()) {
            Ok(draft) => draft,
            Err(errors) => return Ok(Err(errors)),
        };

        if let Some(category_id) = draft.category_id {
            if self.categories.get_category(category_id)?.is_none() {
                let mut errors = FormErrors::default();
                errors.add_error(
                    Some(FormField::Category),
                    "unknown_category",
                    format!("category {category_id} does not exist"),
                );
                return Ok(Err(errors));
            }
        }
        Ok(Ok(draft))
    }
}

fn rejected(event: &str, errors: FormErrors) -> SubmitOutcome {
    warn!("event={event} module=service status=rejected stage=form");
    SubmitOutcome::Rejected(errors)
}

/// Turns a write-time rejection into form errors; other failures propagate.
fn save_rejection(event: &str, err: RepoError) -> ServiceResult<SubmitOutcome> {
    let mut errors = FormErrors::default();
    match err {
        RepoError::Constraint(violation) => {
            warn!(
                "event={event} module=service status=rejected stage=storage code={:?} structured={}",
                violation.code, violation.structured
            );
            violation.apply_to(&mut errors);
        }
        RepoError::Validation(validation) => {
            warn!("event={event} module=service status=rejected stage=repo");
            errors.add_validation_error(&validation);
        }
        other => return Err(other.into()),
    }
    Ok(SubmitOutcome::Rejected(errors))
}

#[cfg(test)]
mod tests {
    use super::TaskServiceError;
    use crate::repo::RepoError;
    use uuid::Uuid;

    #[test]
    fn not_found_maps_by_entity() {
        let id = Uuid::new_v4();
        let category = TaskServiceError::from(RepoError::NotFound {
            entity: "category",
            id,
        });
        assert!(matches!(category, TaskServiceError::CategoryNotFound(found) if found == id));

        let task = TaskServiceError::from(RepoError::NotFound { entity: "task", id });
        assert!(matches!(task, TaskServiceError::TaskNotFound(found) if found == id));
    }
}
