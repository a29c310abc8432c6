//! Domain model for tasks and categories.
//!
//! # Invariants
//! - Every record is identified by a stable UUID.
//! - Task deletion is a tombstone (`is_deleted` + `deleted_at`) until an
//!   explicit hard delete removes the row.

pub mod category;
pub mod task;
