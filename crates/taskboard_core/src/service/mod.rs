//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository and report calls into page-level operations.
//! - Keep the CLI decoupled from storage details.

pub mod task_service;
