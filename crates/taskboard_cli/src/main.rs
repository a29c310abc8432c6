//! Taskboard command-line entry point.
//!
//! # Responsibility
//! - Map subcommands onto `TaskService` operations.
//! - Print every result as JSON on stdout.
//!
//! A rejected form prints its errors and exits with status 1.

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use log::info;
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;
use taskboard_core::{
    default_log_level, init_logging, open_db, StatusFilter, SubmitOutcome, TaskForm, TaskService,
};
use uuid::Uuid;

/// Taskboard - tasks, trash, statistics and combined queries over SQLite
#[derive(Parser, Debug)]
#[command(name = "taskboard", version, about, long_about = None)]
struct Args {
    /// Path to the SQLite database file
    #[arg(
        long,
        global = true,
        env = "TASKBOARD_DB",
        default_value = "taskboard.sqlite3"
    )]
    db: PathBuf,

    /// Log level (trace|debug|info|warn|error)
    #[arg(long, global = true, env = "TASKBOARD_LOG_LEVEL")]
    log_level: Option<String>,

    /// Absolute directory for log files; logging is off when unset
    #[arg(long, global = true, env = "TASKBOARD_LOG_DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List alive tasks
    List {
        /// all|pending|completed
        #[arg(long, default_value = "all")]
        status: String,
        #[arg(long)]
        category: Option<Uuid>,
    },
    /// Create a task
    Add {
        title: String,
        #[command(flatten)]
        fields: FormFields,
    },
    /// Show the prefilled edit form, or save changes when any field is given
    Edit {
        id: Uuid,
        #[arg(long)]
        title: Option<String>,
        #[command(flatten)]
        fields: FormFields,
    },
    /// Mark a task complete
    Complete { id: Uuid },
    /// Move a task to the trash
    Delete { id: Uuid },
    /// Move every alive task matching the filters to the trash
    DeleteMatching {
        #[arg(long, default_value = "all")]
        status: String,
        #[arg(long)]
        category: Option<Uuid>,
    },
    /// List trashed tasks, most recently deleted first
    Trash,
    /// Restore a trashed task
    Restore { id: Uuid },
    /// Delete a task permanently
    Purge { id: Uuid },
    /// Delete every trashed task permanently
    EmptyTrash,
    /// Show task statistics
    Stats,
    /// Combine tasks due on a day with tasks of a priority
    Combined {
        /// YYYY-MM-DD; defaults to today
        #[arg(long)]
        day: Option<String>,
        /// union|intersection|difference
        #[arg(long)]
        op: Option<String>,
        /// High|Medium|Low
        #[arg(long)]
        prio: Option<String>,
    },
    /// List categories
    Categories,
    /// Create a category
    AddCategory {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Delete a category; its tasks keep living without one
    DeleteCategory { id: Uuid },
}

/// Optional task form fields shared by `add` and `edit`.
#[derive(ClapArgs, Debug, Default)]
struct FormFields {
    #[arg(long)]
    description: Option<String>,
    /// YYYY-MM-DD, or an empty string to clear
    #[arg(long)]
    due: Option<String>,
    #[arg(long)]
    priority: Option<String>,
    /// Category id, or an empty string to clear
    #[arg(long)]
    category: Option<String>,
}

impl FormFields {
    fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.due.is_none()
            && self.priority.is_none()
            && self.category.is_none()
    }

    fn apply_to(self, form: &mut TaskForm) {
        if let Some(description) = self.description {
            form.description = description;
        }
        if let Some(due) = self.due {
            form.due_date = due;
        }
        if let Some(priority) = self.priority {
            form.priority = priority;
        }
        if let Some(category) = self.category {
            form.category = category;
        }
    }
}

fn main() -> ExitCode {
    match run(Args::parse()) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<ExitCode> {
    configure_logging(&args)?;

    let conn = open_db(&args.db)
        .with_context(|| format!("failed to open database `{}`", args.db.display()))?;
    let service = TaskService::try_new(&conn).context("database is not ready")?;
    execute(&service, args.command)
}

fn configure_logging(args: &Args) -> Result<()> {
    let Some(log_dir) = &args.log_dir else {
        return Ok(());
    };
    let level = args.log_level.as_deref().unwrap_or(default_log_level());
    let log_dir = log_dir
        .to_str()
        .context("log directory must be valid UTF-8")?;
    init_logging(level, log_dir).context("failed to initialize logging")?;
    info!("event=cli_start module=cli status=ok");
    Ok(())
}

fn execute(service: &TaskService<'_>, command: Command) -> Result<ExitCode> {
    match command {
        Command::List { status, category } => {
            print_json(&service.task_list(StatusFilter::parse(&status), category)?)?;
        }
        Command::Add { title, fields } => {
            let mut form = TaskForm {
                title,
                ..TaskForm::default()
            };
            fields.apply_to(&mut form);
            return submitted(service.create_task(&form)?);
        }
        Command::Edit { id, title, fields } => {
            let page = service.edit_form(id)?;
            if title.is_none() && fields.is_empty() {
                print_json(&page)?;
                return Ok(ExitCode::SUCCESS);
            }
            let mut form = page.form;
            if let Some(title) = title {
                form.title = title;
            }
            fields.apply_to(&mut form);
            return submitted(service.submit_edit(id, &form)?);
        }
        Command::Complete { id } => {
            service.complete_task(id)?;
            print_json(&json!({ "id": id, "completed": true }))?;
        }
        Command::Delete { id } => {
            let changed = service.delete_task(id)?;
            print_json(&json!({ "id": id, "deleted": changed }))?;
        }
        Command::DeleteMatching { status, category } => {
            let deleted = service.delete_matching(StatusFilter::parse(&status), category)?;
            print_json(&json!({ "deleted": deleted }))?;
        }
        Command::Trash => print_json(&service.trash_list()?)?,
        Command::Restore { id } => {
            let changed = service.restore_task(id)?;
            print_json(&json!({ "id": id, "restored": changed }))?;
        }
        Command::Purge { id } => {
            service.hard_delete_task(id)?;
            print_json(&json!({ "id": id, "purged": true }))?;
        }
        Command::EmptyTrash => {
            let purged = service.empty_trash()?;
            print_json(&json!({ "purged": purged }))?;
        }
        Command::Stats => print_json(&service.stats()?)?,
        Command::Combined { day, op, prio } => {
            print_json(&service.combined(day.as_deref(), op.as_deref(), prio.as_deref())?)?;
        }
        Command::Categories => print_json(&service.list_categories()?)?,
        Command::AddCategory { name, description } => {
            print_json(&service.create_category(&name, description)?)?;
        }
        Command::DeleteCategory { id } => {
            service.delete_category(id)?;
            print_json(&json!({ "id": id, "deleted": true }))?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn submitted(outcome: SubmitOutcome) -> Result<ExitCode> {
    print_json(&outcome)?;
    Ok(if outcome.is_saved() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Args, Command, FormFields};
    use clap::Parser;
    use std::path::PathBuf;
    use taskboard_core::TaskForm;

    #[test]
    fn add_parses_optional_fields() {
        let args = Args::try_parse_from([
            "taskboard",
            "--db",
            "/tmp/board.sqlite3",
            "add",
            "Write report",
            "--due",
            "2030-01-01",
            "--priority",
            "High",
        ])
        .unwrap();

        assert_eq!(args.db, PathBuf::from("/tmp/board.sqlite3"));
        match args.command {
            Command::Add { title, fields } => {
                assert_eq!(title, "Write report");
                assert_eq!(fields.due.as_deref(), Some("2030-01-01"));
                assert_eq!(fields.priority.as_deref(), Some("High"));
                assert!(fields.category.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn combined_accepts_raw_parameters() {
        let args = Args::try_parse_from([
            "taskboard",
            "combined",
            "--day",
            "2030-01-01",
            "--op",
            "xor",
        ])
        .unwrap();

        match args.command {
            Command::Combined { day, op, prio } => {
                assert_eq!(day.as_deref(), Some("2030-01-01"));
                assert_eq!(op.as_deref(), Some("xor"));
                assert!(prio.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn edit_rejects_malformed_id() {
        assert!(Args::try_parse_from(["taskboard", "edit", "not-a-uuid"]).is_err());
    }

    #[test]
    fn form_fields_only_override_given_values() {
        let mut form = TaskForm {
            title: "Keep".to_string(),
            description: "old".to_string(),
            due_date: "2030-01-01".to_string(),
            priority: "Low".to_string(),
            category: String::new(),
        };
        let fields = FormFields {
            priority: Some("High".to_string()),
            due: Some(String::new()),
            ..FormFields::default()
        };
        assert!(!fields.is_empty());

        fields.apply_to(&mut form);
        assert_eq!(form.title, "Keep");
        assert_eq!(form.description, "old");
        assert_eq!(form.due_date, "");
        assert_eq!(form.priority, "High");
    }
}
