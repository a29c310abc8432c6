//! Set combinations of two task subsets.
//!
//! Subset A holds alive tasks due on a reference day and subset B holds
//! alive tasks with a given priority. Both are projected through the same
//! [`PROJECTION_SQL`] and combined with SQLite's compound operators, so
//! rows compare as whole tuples and duplicates collapse.
//!
//! # Invariants
//! - Both operands use one shared projection, so column count and order
//!   always match.
//! - Results are ordered by title, then id, after the set operation.

use crate::forms::DATE_FORMAT;
use crate::model::task::{Priority, TaskId};
use crate::report::{parse_report_date, parse_report_priority, ReportError, ReportResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use serde::Serialize;
use uuid::Uuid;

const PROJECTION_SQL: &str = "SELECT
    t.uuid AS id,
    t.title AS title,
    t.due_date AS due_date,
    t.priority AS priority,
    c.name AS category_name,
    t.completed AS completed,
    t.description AS description
FROM tasks t
LEFT JOIN categories c ON c.uuid = t.category_uuid
WHERE t.is_deleted = 0";

/// Set operator applied to subset A (day) and subset B (priority).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SetOperation {
    #[default]
    Union,
    Intersection,
    Difference,
}

impl SetOperation {
    /// Parses `union|intersection|difference`; anything else is `Union`.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("intersection") => Self::Intersection,
            Some("difference") => Self::Difference,
            _ => Self::Union,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Union => "union",
            Self::Intersection => "intersection",
            Self::Difference => "difference",
        }
    }

    /// Human-readable description echoed to the page.
    pub fn label(self) -> &'static str {
        match self {
            Self::Union => "Union (due on day ∪ selected priority)",
            Self::Intersection => "Intersection (due on day ∩ selected priority)",
            Self::Difference => "Difference (due on day − selected priority)",
        }
    }

    fn sql_operator(self) -> &'static str {
        match self {
            Self::Union => "UNION",
            Self::Intersection => "INTERSECT",
            Self::Difference => "EXCEPT",
        }
    }
}

/// Normalized inputs of a combined query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CombinedQuery {
    pub day: NaiveDate,
    pub priority: Priority,
    pub operation: SetOperation,
}

impl CombinedQuery {
    /// Builds a query from raw request parameters.
    ///
    /// - `day`: ISO date; missing or unparsable falls back to `today`.
    /// - `op`: see [`SetOperation::parse`].
    /// - `prio`: `High|Medium|Low`; missing or unknown falls back to `High`.
    pub fn from_params(
        day: Option<&str>,
        op: Option<&str>,
        prio: Option<&str>,
        today: NaiveDate,
    ) -> Self {
        let day = day
            .and_then(|value| NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok())
            .unwrap_or(today);
        let priority = prio
            .and_then(|value| value.trim().parse::<Priority>().ok())
            .unwrap_or(Priority::High);

        Self {
            day,
            priority,
            operation: SetOperation::parse(op),
        }
    }
}

/// One projected task row. Equality covers every column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ProjectedTask {
    pub id: TaskId,
    pub title: String,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
    pub category_name: Option<String>,
    pub completed: bool,
    pub description: Option<String>,
}

/// Runs the combined query and returns rows sorted by title.
pub fn combined_tasks(
    conn: &Connection,
    query: &CombinedQuery,
) -> ReportResult<Vec<ProjectedTask>> {
    let sql = format!(
        "{PROJECTION_SQL} AND t.due_date = ?1
         {operator}
         {PROJECTION_SQL} AND t.priority = ?2
         ORDER BY title ASC, id ASC;",
        operator = query.operation.sql_operator(),
    );

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params![
        query.day.format(DATE_FORMAT).to_string(),
        query.priority.as_str()
    ])?;
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        items.push(parse_projected_row(row)?);
    }
    Ok(items)
}

fn parse_projected_row(row: &Row<'_>) -> ReportResult<ProjectedTask> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        ReportError::InvalidData(format!("invalid uuid value `{id_text}` in tasks.uuid"))
    })?;
    let priority: String = row.get("priority")?;
    let due_date = match row.get::<_, Option<String>>("due_date")? {
        Some(value) => Some(parse_report_date(&value)?),
        None => None,
    };

    Ok(ProjectedTask {
        id,
        title: row.get("title")?,
        due_date,
        priority: parse_report_priority(&priority)?,
        category_name: row.get("category_name")?,
        completed: row.get("completed")?,
        description: row.get("description")?,
    })
}
