//! Task repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD over `tasks` with soft-delete semantics.
//! - Keep the alive/dead/all view selection explicit on every read.
//!
//! # Invariants
//! - `delete`-style entry points (`soft_delete_task`, `soft_delete_matching`)
//!   only tombstone rows. Rows are physically removed solely by
//!   `hard_delete_task` and `hard_delete_matching`.
//! - Tombstone writes touch only `is_deleted` and `deleted_at`.
//! - Field constraints are enforced again by the `tasks_validate_*`
//!   triggers; their aborts surface as `RepoError::Constraint`.

use crate::forms::DATE_FORMAT;
use crate::model::category::CategoryId;
use crate::model::task::{validate_title, Priority, Task, TaskDraft, TaskId, TaskListItem};
use crate::repo::{ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const TASK_ENTITY: &str = "task";

const TASK_SELECT_SQL: &str = "SELECT
    t.uuid,
    t.title,
    t.description,
    t.completed,
    t.due_date,
    t.priority,
    t.category_uuid,
    t.is_deleted,
    t.deleted_at,
    c.name AS category_name
FROM tasks t
LEFT JOIN categories c ON c.uuid = t.category_uuid";

/// Which tombstone state a task query sees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaskView {
    /// `is_deleted = false`; used by every ordinary listing and report.
    #[default]
    Alive,
    /// `is_deleted = true`; the trash.
    Dead,
    /// Both alive and dead rows.
    All,
}

impl TaskView {
    /// SQL predicate over the `is_deleted` column with the given prefix
    /// (`"t."` or `""`).
    pub(crate) fn predicate(self, prefix: &str) -> String {
        match self {
            Self::Alive => format!("{prefix}is_deleted = 0"),
            Self::Dead => format!("{prefix}is_deleted = 1"),
            Self::All => "1 = 1".to_string(),
        }
    }
}

/// Completion filter accepted by the task list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Completed,
}

impl StatusFilter {
    /// Parses `all|pending|completed`; anything else means no filter.
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "pending" => Self::Pending,
            "completed" => Self::Completed,
            _ => Self::All,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }
}

/// Query options for listing and bulk-deleting tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskListQuery {
    pub view: TaskView,
    pub status: StatusFilter,
    pub category_id: Option<CategoryId>,
}

impl TaskListQuery {
    pub fn in_view(view: TaskView) -> Self {
        Self {
            view,
            ..Self::default()
        }
    }
}

/// Repository interface for task persistence.
pub trait TaskRepository {
    fn create_task(&self, task: &Task) -> RepoResult<TaskId>;
    /// Replaces the user-editable fields of an alive task.
    fn update_task(&self, id: TaskId, draft: &TaskDraft) -> RepoResult<()>;
    /// Sets completion on an alive task, touching only `completed`.
    fn set_completed(&self, id: TaskId, completed: bool) -> RepoResult<()>;
    fn get_task(&self, id: TaskId, view: TaskView) -> RepoResult<Option<Task>>;
    fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<TaskListItem>>;
    /// Tombstones one task. `Ok(false)` when it was already deleted.
    fn soft_delete_task(&self, id: TaskId) -> RepoResult<bool>;
    /// Clears one tombstone. `Ok(false)` when the task was alive.
    fn restore_task(&self, id: TaskId) -> RepoResult<bool>;
    /// Physically removes one task in any state.
    fn hard_delete_task(&self, id: TaskId) -> RepoResult<()>;
    /// Tombstones every alive task matching the status/category filters.
    /// The query's view is ignored: only alive rows can be tombstoned.
    fn soft_delete_matching(&self, query: &TaskListQuery) -> RepoResult<usize>;
    /// Physically removes every task matching the query, view included.
    fn hard_delete_matching(&self, query: &TaskListQuery) -> RepoResult<usize>;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    /// Creates a repository over a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["tasks", "categories"])?;
        Ok(Self { conn })
    }

    fn task_exists(&self, id: TaskId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM tasks WHERE uuid = ?1);",
            [id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn missing_or(&self, id: TaskId, found: bool) -> RepoResult<bool> {
        if self.task_exists(id)? {
            Ok(found)
        } else {
            Err(RepoError::NotFound {
                entity: TASK_ENTITY,
                id,
            })
        }
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn create_task(&self, task: &Task) -> RepoResult<TaskId> {
        task.validate()?;

        self.conn.execute(
            "INSERT INTO tasks (
                uuid,
                title,
                description,
                completed,
                due_date,
                priority,
                category_uuid,
                is_deleted,
                deleted_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                task.id.to_string(),
                task.title.as_str(),
                task.description.as_deref(),
                task.completed,
                task.due_date.map(date_to_db),
                task.priority.as_str(),
                task.category_id.map(|id| id.to_string()),
                task.is_deleted,
                task.deleted_at.map(|at| at.timestamp_millis()),
            ],
        )?;

        Ok(task.id)
    }

    fn update_task(&self, id: TaskId, draft: &TaskDraft) -> RepoResult<()> {
        let title = validate_title(&draft.title)?;

        let changed = self.conn.execute(
            "UPDATE tasks
             SET
                title = ?2,
                description = ?3,
                due_date = ?4,
                priority = ?5,
                category_uuid = ?6,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1
               AND is_deleted = 0;",
            params![
                id.to_string(),
                title,
                draft.description.as_deref(),
                draft.due_date.map(date_to_db),
                draft.priority.as_str(),
                draft.category_id.map(|category_id| category_id.to_string()),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: TASK_ENTITY,
                id,
            });
        }
        Ok(())
    }

    fn set_completed(&self, id: TaskId, completed: bool) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE tasks
             SET completed = ?2
             WHERE uuid = ?1
               AND is_deleted = 0;",
            params![id.to_string(), completed],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: TASK_ENTITY,
                id,
            });
        }
        Ok(())
    }

    fn get_task(&self, id: TaskId, view: TaskView) -> RepoResult<Option<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TASK_SELECT_SQL}
             WHERE t.uuid = ?1
               AND {};",
            view.predicate("t.")
        ))?;

        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_task_row(row)?.task)),
            None => Ok(None),
        }
    }

    fn list_tasks(&self, query: &TaskListQuery) -> RepoResult<Vec<TaskListItem>> {
        let mut sql = format!("{TASK_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();
        push_filters(&mut sql, &mut bind_values, query, query.view, "t.");

        match query.view {
            TaskView::Dead => sql.push_str(" ORDER BY t.deleted_at DESC, t.uuid ASC"),
            TaskView::Alive | TaskView::All => sql.push_str(
                " ORDER BY
                    t.due_date IS NULL,
                    t.due_date ASC,
                    CASE t.priority WHEN 'High' THEN 0 WHEN 'Medium' THEN 1 ELSE 2 END,
                    t.title ASC,
                    t.uuid ASC",
            ),
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_task_row(row)?);
        }
        Ok(items)
    }

    fn soft_delete_task(&self, id: TaskId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE tasks
             SET
                is_deleted = 1,
                deleted_at = ?2
             WHERE uuid = ?1
               AND is_deleted = 0;",
            params![id.to_string(), Utc::now().timestamp_millis()],
        )?;

        if changed == 1 {
            return Ok(true);
        }
        self.missing_or(id, false)
    }

    fn restore_task(&self, id: TaskId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE tasks
             SET
                is_deleted = 0,
                deleted_at = NULL
             WHERE uuid = ?1
               AND is_deleted = 1;",
            [id.to_string()],
        )?;

        if changed == 1 {
            return Ok(true);
        }
        self.missing_or(id, false)
    }

    fn hard_delete_task(&self, id: TaskId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM tasks WHERE uuid = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: TASK_ENTITY,
                id,
            });
        }
        Ok(())
    }

    fn soft_delete_matching(&self, query: &TaskListQuery) -> RepoResult<usize> {
        let mut sql = String::from(
            "UPDATE tasks
             SET
                is_deleted = 1,
                deleted_at = ?
             WHERE 1 = 1",
        );
        let mut bind_values = vec![Value::Integer(Utc::now().timestamp_millis())];
        push_filters(&mut sql, &mut bind_values, query, TaskView::Alive, "");

        let changed = self
            .conn
            .execute(&sql, params_from_iter(bind_values))?;
        Ok(changed)
    }

    fn hard_delete_matching(&self, query: &TaskListQuery) -> RepoResult<usize> {
        let mut sql = String::from("DELETE FROM tasks WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();
        push_filters(&mut sql, &mut bind_values, query, query.view, "");

        let changed = self
            .conn
            .execute(&sql, params_from_iter(bind_values))?;
        Ok(changed)
    }
}

fn push_filters(
    sql: &mut String,
    bind_values: &mut Vec<Value>,
    query: &TaskListQuery,
    view: TaskView,
    prefix: &str,
) {
    sql.push_str(&format!(" AND {}", view.predicate(prefix)));

    match query.status {
        StatusFilter::All => {}
        StatusFilter::Pending => sql.push_str(&format!(" AND {prefix}completed = 0")),
        StatusFilter::Completed => sql.push_str(&format!(" AND {prefix}completed = 1")),
    }

    if let Some(category_id) = query.category_id {
        sql.push_str(&format!(" AND {prefix}category_uuid = ?"));
        bind_values.push(Value::Text(category_id.to_string()));
    }
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<TaskListItem> {
    let uuid_text: String = row.get("uuid")?;
    let id = parse_uuid(&uuid_text, "tasks.uuid")?;

    let priority_text: String = row.get("priority")?;
    let priority = priority_text.parse::<Priority>().map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid priority `{priority_text}` in tasks.priority"
        ))
    })?;

    let due_date = match row.get::<_, Option<String>>("due_date")? {
        Some(value) => Some(date_from_db(&value)?),
        None => None,
    };

    let category_id = match row.get::<_, Option<String>>("category_uuid")? {
        Some(value) => Some(parse_uuid(&value, "tasks.category_uuid")?),
        None => None,
    };

    let deleted_at = match row.get::<_, Option<i64>>("deleted_at")? {
        Some(millis) => Some(DateTime::<Utc>::from_timestamp_millis(millis).ok_or_else(|| {
            RepoError::InvalidData(format!("invalid timestamp `{millis}` in tasks.deleted_at"))
        })?),
        None => None,
    };

    let task = Task {
        id,
        title: row.get("title")?,
        description: row.get("description")?,
        completed: row.get("completed")?,
        due_date,
        priority,
        category_id,
        is_deleted: row.get("is_deleted")?,
        deleted_at,
    };
    task.validate()
        .map_err(|err| RepoError::InvalidData(format!("task {id}: {err}")))?;

    Ok(TaskListItem {
        task,
        category_name: row.get("category_name")?,
    })
}

pub(crate) fn date_to_db(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub(crate) fn date_from_db(value: &str) -> RepoResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| RepoError::InvalidData(format!("invalid date `{value}` in tasks.due_date")))
}
