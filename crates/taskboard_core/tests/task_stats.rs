use chrono::{Local, NaiveDate};
use rusqlite::Connection;
use taskboard_core::db::open_db_in_memory;
use taskboard_core::report::stats::{
    overdue_by_category, status_by_priority, task_stats, tasks_by_category, tasks_by_due_date,
    CategoryCount, DueDateCount, PriorityStatus, NO_CATEGORY_LABEL, NO_DATE_LABEL,
};
use taskboard_core::{
    Category, CategoryId, CategoryRepository, Priority, SqliteCategoryRepository,
    SqliteTaskRepository, Task, TaskRepository,
};

struct Fixture {
    conn: Connection,
    tomorrow: NaiveDate,
}

fn category(conn: &Connection, name: &str) -> CategoryId {
    let categories = SqliteCategoryRepository::try_new(conn).unwrap();
    categories
        .create_category(&Category::new(name, "").unwrap())
        .unwrap()
}

fn add_task(
    conn: &Connection,
    title: &str,
    category_id: Option<CategoryId>,
    priority: Priority,
    due_date: Option<NaiveDate>,
) -> Task {
    let repo = SqliteTaskRepository::try_new(conn).unwrap();
    let mut task = Task::new(title);
    task.category_id = category_id;
    task.priority = priority;
    task.due_date = due_date;
    repo.create_task(&task).unwrap();
    task
}

/// catA: 2 tasks, catB: 1 task, no category: 1 task, plus one deleted
/// task in catB that must never be counted.
fn seeded() -> Fixture {
    let conn = open_db_in_memory().unwrap();
    let tomorrow = Local::now().date_naive().succ_opt().unwrap();
    let cat_a = category(&conn, "catA");
    let cat_b = category(&conn, "catB");

    add_task(&conn, "a1", Some(cat_a), Priority::High, Some(tomorrow));
    let a2 = add_task(&conn, "a2", Some(cat_a), Priority::Low, None);
    add_task(&conn, "b1", Some(cat_b), Priority::Medium, Some(tomorrow));
    add_task(&conn, "n1", None, Priority::Medium, None);
    let deleted = add_task(&conn, "b2", Some(cat_b), Priority::High, Some(tomorrow));

    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    repo.set_completed(a2.id, true).unwrap();
    repo.soft_delete_task(deleted.id).unwrap();
    drop(repo);

    Fixture { conn, tomorrow }
}

fn named(name: &str, count: i64) -> CategoryCount {
    CategoryCount {
        category_name: Some(name.to_string()),
        count,
    }
}

fn uncategorized(count: i64) -> CategoryCount {
    CategoryCount {
        category_name: None,
        count,
    }
}

#[test]
fn tasks_by_category_orders_by_count_with_none_group_last() {
    let fixture = seeded();

    let counts = tasks_by_category(&fixture.conn).unwrap();
    assert_eq!(
        counts,
        vec![named("catA", 2), named("catB", 1), uncategorized(1)]
    );
    assert_eq!(counts[2].label(), NO_CATEGORY_LABEL);
}

#[test]
fn status_by_priority_splits_pending_and_completed() {
    let fixture = seeded();

    let statuses = status_by_priority(&fixture.conn).unwrap();
    assert_eq!(
        statuses,
        vec![
            PriorityStatus {
                priority: Priority::High,
                pending: 1,
                completed: 0,
            },
            PriorityStatus {
                priority: Priority::Low,
                pending: 0,
                completed: 1,
            },
            PriorityStatus {
                priority: Priority::Medium,
                pending: 2,
                completed: 0,
            },
        ]
    );
}

#[test]
fn overdue_counts_depend_on_today_and_keep_zero_groups() {
    let fixture = seeded();
    let real_today = Local::now().date_naive();
    let later = fixture.tomorrow.succ_opt().unwrap();

    let none_overdue = overdue_by_category(&fixture.conn, real_today).unwrap();
    assert!(none_overdue.iter().all(|row| row.count == 0));
    assert_eq!(none_overdue.len(), 3);

    let overdue = overdue_by_category(&fixture.conn, later).unwrap();
    assert_eq!(
        overdue,
        vec![named("catA", 1), named("catB", 1), uncategorized(0)]
    );
}

#[test]
fn completed_tasks_are_never_overdue() {
    let conn = open_db_in_memory().unwrap();
    let tomorrow = Local::now().date_naive().succ_opt().unwrap();
    let done = add_task(&conn, "done", None, Priority::Low, Some(tomorrow));
    SqliteTaskRepository::try_new(&conn)
        .unwrap()
        .set_completed(done.id, true)
        .unwrap();

    let overdue = overdue_by_category(&conn, tomorrow.succ_opt().unwrap()).unwrap();
    assert_eq!(overdue, vec![uncategorized(0)]);
}

#[test]
fn tasks_by_due_date_puts_no_date_bucket_last() {
    let fixture = seeded();

    let counts = tasks_by_due_date(&fixture.conn).unwrap();
    assert_eq!(
        counts,
        vec![
            DueDateCount {
                due_date: Some(fixture.tomorrow),
                count: 2,
            },
            DueDateCount {
                due_date: None,
                count: 2,
            },
        ]
    );
    assert_eq!(counts[1].label(), NO_DATE_LABEL);
}

#[test]
fn chart_data_mirrors_aggregates() {
    let fixture = seeded();

    let stats = task_stats(&fixture.conn, Local::now().date_naive()).unwrap();
    let chart = stats.chart_data();

    assert_eq!(chart.category_labels, vec!["catA", "catB", NO_CATEGORY_LABEL]);
    assert_eq!(chart.category_totals, vec![2, 1, 1]);
    assert_eq!(chart.priority_labels, vec!["High", "Low", "Medium"]);
    assert_eq!(chart.priority_pending, vec![1, 0, 2]);
    assert_eq!(chart.priority_completed, vec![0, 1, 0]);
    assert_eq!(
        chart.day_labels,
        vec![
            fixture.tomorrow.format("%Y-%m-%d").to_string(),
            NO_DATE_LABEL.to_string()
        ]
    );
    assert_eq!(chart.day_totals, vec![2, 2]);
    assert_eq!(chart.overdue_totals, vec![0, 0, 0]);
}

#[test]
fn empty_store_yields_empty_aggregates() {
    let conn = open_db_in_memory().unwrap();

    let stats = task_stats(&conn, Local::now().date_naive()).unwrap();
    assert!(stats.by_category.is_empty());
    assert!(stats.by_priority.is_empty());
    assert!(stats.overdue_by_category.is_empty());
    assert!(stats.by_due_date.is_empty());

    let json = serde_json::to_value(stats.chart_data()).unwrap();
    assert_eq!(json["category_labels"], serde_json::json!([]));
}
