//! Grouped task counts for the statistics page.
//!
//! # Invariants
//! - Only alive tasks are counted.
//! - Category groups key on the category name; tasks without a category
//!   (or whose category was deleted) share one `None` group rendered as
//!   [`NO_CATEGORY_LABEL`].
//! - Count ties order named groups by name, then the `None` group last.

use crate::forms::DATE_FORMAT;
use crate::model::task::Priority;
use crate::report::{parse_report_date, parse_report_priority, ReportResult};
use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;

pub const NO_CATEGORY_LABEL: &str = "No category";
pub const NO_DATE_LABEL: &str = "No date";

/// Task count for one category name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category_name: Option<String>,
    pub count: i64,
}

impl CategoryCount {
    pub fn label(&self) -> &str {
        self.category_name.as_deref().unwrap_or(NO_CATEGORY_LABEL)
    }
}

/// Pending and completed counts for one priority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriorityStatus {
    pub priority: Priority,
    pub pending: i64,
    pub completed: i64,
}

/// Task count for one due date; `None` is the no-date bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DueDateCount {
    pub due_date: Option<NaiveDate>,
    pub count: i64,
}

impl DueDateCount {
    pub fn label(&self) -> String {
        self.due_date
            .map(|date| date.format(DATE_FORMAT).to_string())
            .unwrap_or_else(|| NO_DATE_LABEL.to_string())
    }
}

/// The four statistics aggregates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskStats {
    pub by_category: Vec<CategoryCount>,
    pub by_priority: Vec<PriorityStatus>,
    pub overdue_by_category: Vec<CategoryCount>,
    pub by_due_date: Vec<DueDateCount>,
}

/// Parallel label/value arrays ready for a charting widget.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChartData {
    pub category_labels: Vec<String>,
    pub category_totals: Vec<i64>,
    pub priority_labels: Vec<String>,
    pub priority_pending: Vec<i64>,
    pub priority_completed: Vec<i64>,
    pub day_labels: Vec<String>,
    pub day_totals: Vec<i64>,
    pub overdue_labels: Vec<String>,
    pub overdue_totals: Vec<i64>,
}

impl TaskStats {
    pub fn chart_data(&self) -> ChartData {
        ChartData {
            category_labels: self.by_category.iter().map(|row| row.label().to_string()).collect(),
            category_totals: self.by_category.iter().map(|row| row.count).collect(),
            priority_labels: self
                .by_priority
                .iter()
                .map(|row| row.priority.as_str().to_string())
                .collect(),
            priority_pending: self.by_priority.iter().map(|row| row.pending).collect(),
            priority_completed: self.by_priority.iter().map(|row| row.completed).collect(),
            day_labels: self.by_due_date.iter().map(DueDateCount::label).collect(),
            day_totals: self.by_due_date.iter().map(|row| row.count).collect(),
            overdue_labels: self
                .overdue_by_category
                .iter()
                .map(|row| row.label().to_string())
                .collect(),
            overdue_totals: self.overdue_by_category.iter().map(|row| row.count).collect(),
        }
    }
}

/// Computes all four aggregates. `today` decides what counts as overdue.
pub fn task_stats(conn: &Connection, today: NaiveDate) -> ReportResult<TaskStats> {
    Ok(TaskStats {
        by_category: tasks_by_category(conn)?,
        by_priority: status_by_priority(conn)?,
        overdue_by_category: overdue_by_category(conn, today)?,
        by_due_date: tasks_by_due_date(conn)?,
    })
}

/// Alive task count per category, highest count first.
pub fn tasks_by_category(conn: &Connection) -> ReportResult<Vec<CategoryCount>> {
    let mut stmt = conn.prepare(
        "SELECT
            c.name AS category_name,
            COUNT(t.uuid) AS total
         FROM tasks t
         LEFT JOIN categories c ON c.uuid = t.category_uuid
         WHERE t.is_deleted = 0
         GROUP BY c.name
         ORDER BY total DESC, c.name IS NULL, c.name ASC;",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(CategoryCount {
            category_name: row.get("category_name")?,
            count: row.get("total")?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Pending/completed split per priority present among alive tasks,
/// ordered by the priority's stored value ascending.
pub fn status_by_priority(conn: &Connection) -> ReportResult<Vec<PriorityStatus>> {
    let mut stmt = conn.prepare(
        "SELECT
            t.priority AS priority,
            SUM(CASE WHEN t.completed = 0 THEN 1 ELSE 0 END) AS pending,
            SUM(CASE WHEN t.completed = 1 THEN 1 ELSE 0 END) AS completed
         FROM tasks t
         WHERE t.is_deleted = 0
         GROUP BY t.priority
         ORDER BY t.priority ASC;",
    )?;
    let mut rows = stmt.query([])?;
    let mut statuses = Vec::new();
    while let Some(row) = rows.next()? {
        let priority: String = row.get("priority")?;
        statuses.push(PriorityStatus {
            priority: parse_report_priority(&priority)?,
            pending: row.get("pending")?,
            completed: row.get("completed")?,
        });
    }
    Ok(statuses)
}

/// Incomplete tasks due strictly before `today`, per category.
///
/// Every category group that has alive tasks is listed, including groups
/// with zero overdue tasks, so the chart keeps a stable set of bars.
pub fn overdue_by_category(
    conn: &Connection,
    today: NaiveDate,
) -> ReportResult<Vec<CategoryCount>> {
    let mut stmt = conn.prepare(
        "SELECT
            c.name AS category_name,
            SUM(
                CASE
                    WHEN t.completed = 0 AND t.due_date IS NOT NULL AND t.due_date < ?1
                    THEN 1
                    ELSE 0
                END
            ) AS overdue
         FROM tasks t
         LEFT JOIN categories c ON c.uuid = t.category_uuid
         WHERE t.is_deleted = 0
         GROUP BY c.name
         ORDER BY overdue DESC, c.name IS NULL, c.name ASC;",
    )?;
    let today = today.format(DATE_FORMAT).to_string();
    let rows = stmt.query_map([today], |row| {
        Ok(CategoryCount {
            category_name: row.get("category_name")?,
            count: row.get("overdue")?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Alive task count per due date, earliest first, no-date bucket last.
pub fn tasks_by_due_date(conn: &Connection) -> ReportResult<Vec<DueDateCount>> {
    let mut stmt = conn.prepare(
        "SELECT
            t.due_date AS due_date,
            COUNT(t.uuid) AS total
         FROM tasks t
         WHERE t.is_deleted = 0
         GROUP BY t.due_date
         ORDER BY t.due_date IS NULL, t.due_date ASC;",
    )?;
    let mut rows = stmt.query([])?;
    let mut counts = Vec::new();
    while let Some(row) = rows.next()? {
        let due_date = match row.get::<_, Option<String>>("due_date")? {
            Some(value) => Some(parse_report_date(&value)?),
            None => None,
        };
        counts.push(DueDateCount {
            due_date,
            count: row.get("total")?,
        });
    }
    Ok(counts)
}
