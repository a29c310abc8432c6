use chrono::{Local, NaiveDate};
use rusqlite::Connection;
use taskboard_core::db::open_db_in_memory;
use taskboard_core::{
    Category, CategoryRepository, Priority, RepoError, SqliteCategoryRepository,
    SqliteTaskRepository, StatusFilter, Task, TaskDraft, TaskListQuery, TaskRepository, TaskView,
};
use uuid::Uuid;

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn tomorrow() -> NaiveDate {
    today().succ_opt().unwrap()
}

fn titles(repo: &SqliteTaskRepository<'_>, query: &TaskListQuery) -> Vec<String> {
    repo.list_tasks(query)
        .unwrap()
        .into_iter()
        .map(|item| item.task.title)
        .collect()
}

#[test]
fn create_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let mut task = Task::new("write report");
    task.description = Some("quarterly numbers".to_string());
    task.due_date = Some(tomorrow());
    task.priority = Priority::High;
    let id = repo.create_task(&task).unwrap();

    let loaded = repo.get_task(id, TaskView::Alive).unwrap().unwrap();
    assert_eq!(loaded, task);
    assert!(repo.get_task(id, TaskView::Dead).unwrap().is_none());
    assert!(repo.get_task(id, TaskView::All).unwrap().is_some());
}

#[test]
fn create_rejects_blank_title_before_sql() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let err = repo.create_task(&Task::new("  \t")).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
}

#[test]
fn soft_delete_then_restore_round_trips() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let task = Task::new("laundry");
    let id = repo.create_task(&task).unwrap();

    assert!(repo.soft_delete_task(id).unwrap());
    let dead = repo.get_task(id, TaskView::Dead).unwrap().unwrap();
    assert!(dead.is_deleted);
    let first_deleted_at = dead.deleted_at.unwrap();
    assert!(repo.get_task(id, TaskView::Alive).unwrap().is_none());

    assert!(!repo.soft_delete_task(id).unwrap());
    let still_dead = repo.get_task(id, TaskView::Dead).unwrap().unwrap();
    assert_eq!(still_dead.deleted_at, Some(first_deleted_at));

    assert!(repo.restore_task(id).unwrap());
    assert!(!repo.restore_task(id).unwrap());
    let restored = repo.get_task(id, TaskView::Alive).unwrap().unwrap();
    assert_eq!(restored, task);
}

#[test]
fn missing_ids_return_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    let missing = Uuid::new_v4();

    for err in [
        repo.soft_delete_task(missing).unwrap_err(),
        repo.restore_task(missing).unwrap_err(),
        repo.hard_delete_task(missing).unwrap_err(),
        repo.set_completed(missing, true).unwrap_err(),
        repo.update_task(missing, &TaskDraft::new("x")).unwrap_err(),
    ] {
        assert!(
            matches!(err, RepoError::NotFound { entity: "task", id } if id == missing),
            "unexpected error: {err}"
        );
    }
}

#[test]
fn hard_delete_removes_task_from_every_view() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let alive = repo.create_task(&Task::new("alive")).unwrap();
    let dead = repo.create_task(&Task::new("dead")).unwrap();
    repo.soft_delete_task(dead).unwrap();

    repo.hard_delete_task(alive).unwrap();
    repo.hard_delete_task(dead).unwrap();

    for id in [alive, dead] {
        assert!(repo.get_task(id, TaskView::All).unwrap().is_none());
    }
    assert!(titles(&repo, &TaskListQuery::in_view(TaskView::All)).is_empty());
}

#[test]
fn default_listing_never_includes_deleted_tasks() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    repo.create_task(&Task::new("keep")).unwrap();
    let gone = repo.create_task(&Task::new("gone")).unwrap();
    repo.soft_delete_task(gone).unwrap();

    assert_eq!(titles(&repo, &TaskListQuery::default()), vec!["keep"]);
    assert_eq!(
        titles(&repo, &TaskListQuery::in_view(TaskView::Dead)),
        vec!["gone"]
    );
    assert_eq!(
        titles(&repo, &TaskListQuery::in_view(TaskView::All)).len(),
        2
    );
}

#[test]
fn list_orders_by_due_date_then_priority_with_undated_last() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let mut undated = Task::new("undated");
    undated.priority = Priority::High;
    let mut later_low = Task::new("later low");
    later_low.due_date = Some(tomorrow());
    later_low.priority = Priority::Low;
    let mut later_high = Task::new("later high");
    later_high.due_date = Some(tomorrow());
    later_high.priority = Priority::High;
    let mut today_task = Task::new("today");
    today_task.due_date = Some(today());

    for task in [&undated, &later_low, &later_high, &today_task] {
        repo.create_task(task).unwrap();
    }

    assert_eq!(
        titles(&repo, &TaskListQuery::default()),
        vec!["today", "later high", "later low", "undated"]
    );
}

#[test]
fn list_filters_by_status_and_category() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    let categories = SqliteCategoryRepository::try_new(&conn).unwrap();
    let work = Category::new("Work", "").unwrap();
    categories.create_category(&work).unwrap();

    let mut filed = Task::new("filed");
    filed.category_id = Some(work.id);
    let filed_id = repo.create_task(&filed).unwrap();
    repo.create_task(&Task::new("loose")).unwrap();
    repo.set_completed(filed_id, true).unwrap();

    let completed = TaskListQuery {
        status: StatusFilter::Completed,
        ..TaskListQuery::default()
    };
    assert_eq!(titles(&repo, &completed), vec!["filed"]);

    let pending = TaskListQuery {
        status: StatusFilter::Pending,
        ..TaskListQuery::default()
    };
    assert_eq!(titles(&repo, &pending), vec!["loose"]);

    let in_work = TaskListQuery {
        category_id: Some(work.id),
        ..TaskListQuery::default()
    };
    let items = repo.list_tasks(&in_work).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].category_name.as_deref(), Some("Work"));
}

#[test]
fn set_completed_toggles_and_skips_dead_tasks() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let id = repo.create_task(&Task::new("toggle")).unwrap();
    repo.set_completed(id, true).unwrap();
    assert!(repo.get_task(id, TaskView::Alive).unwrap().unwrap().completed);
    repo.set_completed(id, false).unwrap();
    assert!(!repo.get_task(id, TaskView::Alive).unwrap().unwrap().completed);

    repo.soft_delete_task(id).unwrap();
    assert!(matches!(
        repo.set_completed(id, true).unwrap_err(),
        RepoError::NotFound { .. }
    ));
}

#[test]
fn update_replaces_editable_fields_only() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let id = repo.create_task(&Task::new("before")).unwrap();
    repo.set_completed(id, true).unwrap();

    let draft = TaskDraft {
        title: "  after  ".to_string(),
        description: Some("details".to_string()),
        due_date: Some(tomorrow()),
        priority: Priority::Low,
        category_id: None,
    };
    repo.update_task(id, &draft).unwrap();

    let loaded = repo.get_task(id, TaskView::Alive).unwrap().unwrap();
    assert_eq!(loaded.title, "after");
    assert_eq!(loaded.description.as_deref(), Some("details"));
    assert_eq!(loaded.due_date, Some(tomorrow()));
    assert_eq!(loaded.priority, Priority::Low);
    assert!(loaded.completed);
}

#[test]
fn bulk_soft_delete_only_tombstones_matching_alive_tasks() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let done = repo.create_task(&Task::new("done")).unwrap();
    repo.create_task(&Task::new("open")).unwrap();
    repo.set_completed(done, true).unwrap();

    let query = TaskListQuery {
        status: StatusFilter::Completed,
        ..TaskListQuery::default()
    };
    assert_eq!(repo.soft_delete_matching(&query).unwrap(), 1);
    assert_eq!(repo.soft_delete_matching(&query).unwrap(), 0);

    assert_eq!(titles(&repo, &TaskListQuery::default()), vec!["open"]);
    let trashed = repo.get_task(done, TaskView::Dead).unwrap().unwrap();
    assert!(trashed.deleted_at.is_some());
}

#[test]
fn empty_trash_keeps_alive_tasks() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    repo.create_task(&Task::new("alive")).unwrap();
    for title in ["dead one", "dead two"] {
        let id = repo.create_task(&Task::new(title)).unwrap();
        repo.soft_delete_task(id).unwrap();
    }

    let purged = repo
        .hard_delete_matching(&TaskListQuery::in_view(TaskView::Dead))
        .unwrap();
    assert_eq!(purged, 2);
    assert_eq!(
        titles(&repo, &TaskListQuery::in_view(TaskView::All)),
        vec!["alive"]
    );
}

#[test]
fn deleting_category_detaches_its_tasks() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    let categories = SqliteCategoryRepository::try_new(&conn).unwrap();
    let study = Category::new("Study", "").unwrap();
    categories.create_category(&study).unwrap();

    let mut task = Task::new("read chapter");
    task.category_id = Some(study.id);
    let id = repo.create_task(&task).unwrap();

    categories.delete_category(study.id).unwrap();

    let loaded = repo.get_task(id, TaskView::Alive).unwrap().unwrap();
    assert_eq!(loaded.category_id, None);
    assert!(categories.get_category(study.id).unwrap().is_none());
}

#[test]
fn default_categories_are_created_once() {
    let conn = open_db_in_memory().unwrap();
    let categories = SqliteCategoryRepository::try_new(&conn).unwrap();

    assert_eq!(categories.ensure_default_categories().unwrap(), 4);
    assert_eq!(categories.ensure_default_categories().unwrap(), 0);

    let names: Vec<String> = categories
        .list_categories()
        .unwrap()
        .into_iter()
        .map(|category| category.name)
        .collect();
    assert_eq!(names, vec!["Other", "Personal", "Study", "Work"]);
}

#[test]
fn duplicate_category_name_is_a_constraint_violation() {
    let conn = open_db_in_memory().unwrap();
    let categories = SqliteCategoryRepository::try_new(&conn).unwrap();

    categories
        .create_category(&Category::new("Home", "").unwrap())
        .unwrap();
    let err = categories
        .create_category(&Category::new(" Home ", "").unwrap())
        .unwrap_err();
    assert!(matches!(err, RepoError::Constraint(_)));
}

#[test]
fn corrupted_rows_surface_as_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    insert_raw_tombstone_mismatch(&conn);
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let err = repo.list_tasks(&TaskListQuery::default()).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}

fn insert_raw_tombstone_mismatch(conn: &Connection) {
    conn.execute_batch(
        "PRAGMA ignore_check_constraints = ON;
         INSERT INTO tasks (uuid, title, priority, is_deleted, deleted_at)
         VALUES ('6f1c2a52-8d1e-4c53-9a5c-2f1d0c7b9e11', 'broken', 'Medium', 0, 1700000000000);
         PRAGMA ignore_check_constraints = OFF;",
    )
    .unwrap();
}
