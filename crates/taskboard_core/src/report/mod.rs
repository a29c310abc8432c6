//! Read-only reporting over alive tasks.
//!
//! # Responsibility
//! - Grouped counts for the statistics page (`stats`).
//! - Set combinations of two projected task subsets (`combined`).
//!
//! # Invariants
//! - Every query filters `is_deleted = 0`; tombstoned tasks never count.
//! - Results are computed fresh per call and ordered deterministically.

use crate::db::DbError;
use crate::forms::DATE_FORMAT;
use crate::model::task::Priority;
use chrono::NaiveDate;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod combined;
pub mod stats;

pub type ReportResult<T> = Result<T, ReportError>;

/// Report-layer error for DB interaction and row decoding.
#[derive(Debug)]
pub enum ReportError {
    Db(DbError),
    InvalidData(String),
}

impl Display for ReportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid report row: {message}"),
        }
    }
}

impl Error for ReportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<rusqlite::Error> for ReportError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

pub(crate) fn parse_report_date(value: &str) -> ReportResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| ReportError::InvalidData(format!("invalid date `{value}` in tasks.due_date")))
}

pub(crate) fn parse_report_priority(value: &str) -> ReportResult<Priority> {
    value.parse().map_err(|_| {
        ReportError::InvalidData(format!("invalid priority `{value}` in tasks.priority"))
    })
}
