//! Tests for SqliteTaskRepository.

use crate::db::{
    Database, DbError, SqliteDatabase, SyncState, Task, TaskRepository, TodoList,
    TodoListRepository,
};

async fn setup_db() -> SqliteDatabase {
    let db = SqliteDatabase::in_memory()
        .await
        .expect("Failed to create in-memory database");
    db.migrate().await.expect("Migration should succeed");

    // Tasks need a parent list (FK)
    db.todo_lists()
        .insert_all(&[
            TodoList::new("list0001", "user0001", "Errands", "2025-01-01 00:00:00"),
            TodoList::new("list0002", "user0001", "Work", "2025-01-01 00:00:00"),
        ])
        .await
        .expect("Create task lists should succeed");
    db
}

fn make_task(id: &str, list_id: &str, title: &str) -> Task {
    Task::new(id, list_id, title, "2025-01-01 00:00:00")
}

#[tokio::test(flavor = "multi_thread")]
async fn task_insert_and_get() {
    let db = setup_db().await;
    let tasks = db.tasks();

    let task = Task {
        description: Some("Two litres, semi-skimmed".to_string()),
        reminder: Some("2025-01-02 09:00:00".to_string()),
        position: 3,
        ..make_task("task0001", "list0001", "Buy milk")
    };
    tasks.insert(&task).await.expect("Insert should succeed");

    let retrieved = tasks
        .get("task0001")
        .await
        .expect("Get should succeed")
        .expect("Task should exist");
    assert_eq!(retrieved, task);
}

#[tokio::test(flavor = "multi_thread")]
async fn task_get_nonexistent_returns_none() {
    let db = setup_db().await;

    let result = db.tasks().get("nonexist").await.expect("Get should succeed");
    assert!(result.is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn task_insert_with_unknown_list_is_constraint_error() {
    let db = setup_db().await;

    let err = db
        .tasks()
        .insert(&make_task("task0001", "nolist01", "Orphan"))
        .await
        .expect_err("Insert must fail");
    assert!(
        matches!(err, DbError::Constraint { .. }),
        "expected Constraint error, got {err:?}"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn task_list_by_list_filters_by_parent() {
    let db = setup_db().await;
    let tasks = db.tasks();

    tasks
        .insert_all(&[
            make_task("taskby01", "list0001", "Task in list one"),
            make_task("taskby02", "list0001", "Another in list one"),
            make_task("taskby03", "list0002", "Task in list two"),
        ])
        .await
        .unwrap();

    assert_eq!(tasks.list_by_list("list0001").await.unwrap().len(), 2);
    assert_eq!(tasks.list_by_list("list0002").await.unwrap().len(), 1);
    assert_eq!(tasks.list_all().await.unwrap().len(), 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn task_listing_sinks_completed_tasks() {
    let db = setup_db().await;
    let tasks = db.tasks();

    tasks
        .insert_all(&[
            Task {
                position: 2,
                ..make_task("taska001", "list0001", "A")
            },
            Task {
                completed: true,
                position: 1,
                ..make_task("taskb001", "list0001", "B")
            },
            Task {
                position: 1,
                ..make_task("taskc001", "list0001", "C")
            },
        ])
        .await
        .unwrap();

    let titles: Vec<String> = tasks
        .list_by_list("list0001")
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.title)
        .collect();
    assert_eq!(titles, vec!["C", "A", "B"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn task_position_ties_break_newest_first() {
    let db = setup_db().await;
    let tasks = db.tasks();

    tasks
        .insert_all(&[
            Task::new("taskold1", "list0001", "Older", "2025-01-01 00:00:00"),
            Task::new("tasknew1", "list0001", "Newer", "2025-01-02 00:00:00"),
        ])
        .await
        .unwrap();

    let titles: Vec<String> = tasks
        .list_by_list("list0001")
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.title)
        .collect();
    assert_eq!(titles, vec!["Newer", "Older"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn task_reposition_keeps_updated_at() {
    let db = setup_db().await;
    let tasks = db.tasks();

    let mut task = make_task("task0001", "list0001", "Buy milk");
    task.sync_state = SyncState::Clean;
    tasks.insert(&task).await.unwrap();

    let affected = tasks.reposition("task0001", 7).await.expect("Reposition should succeed");
    assert_eq!(affected, 1);

    let moved = tasks.get("task0001").await.unwrap().unwrap();
    assert_eq!(moved.position, 7);
    assert_eq!(moved.updated_at, task.updated_at);
    assert_eq!(moved.sync_state, SyncState::Dirty);
}

#[tokio::test(flavor = "multi_thread")]
async fn task_set_completed_updates_timestamp_and_dirty_flag() {
    let db = setup_db().await;
    let tasks = db.tasks();

    let mut task = make_task("task0001", "list0001", "Buy milk");
    task.sync_state = SyncState::Clean;
    tasks.insert(&task).await.unwrap();

    tasks
        .set_completed("task0001", true, "2025-01-03 10:00:00")
        .await
        .expect("Toggle should succeed");

    let done = tasks.get("task0001").await.unwrap().unwrap();
    assert!(done.completed);
    assert_eq!(done.updated_at, "2025-01-03 10:00:00");
    assert_eq!(done.sync_state, SyncState::Dirty);
    assert_eq!(tasks.count_completed_by_list("list0001").await.unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn task_reorder_assigns_sequential_positions() {
    let db = setup_db().await;
    let tasks = db.tasks();

    tasks
        .insert_all(&[
            make_task("task0001", "list0001", "First"),
            make_task("task0002", "list0001", "Second"),
            make_task("task0003", "list0001", "Third"),
        ])
        .await
        .unwrap();

    let ids = vec![
        "task0003".to_string(),
        "task0001".to_string(),
        "task0002".to_string(),
    ];
    let updated = tasks.reorder(&ids).await.expect("Reorder should succeed");
    assert_eq!(updated, 3);

    let titles: Vec<String> = tasks
        .list_by_list("list0001")
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.title)
        .collect();
    assert_eq!(titles, vec!["Third", "First", "Second"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn task_soft_delete_hides_row_and_counts() {
    let db = setup_db().await;
    let tasks = db.tasks();

    tasks
        .insert_all(&[
            make_task("task0001", "list0001", "Keep"),
            make_task("task0002", "list0001", "Drop"),
        ])
        .await
        .unwrap();

    tasks.mark_deleted("task0002").await.expect("Soft delete should succeed");

    assert!(tasks.get("task0002").await.unwrap().is_none());
    assert_eq!(tasks.count_by_list("list0001").await.unwrap(), 1);
    assert_eq!(tasks.list_by_list("list0001").await.unwrap().len(), 1);

    let deleted = tasks.list_deleted().await.unwrap();
    assert_eq!(deleted.len(), 1);
    assert_eq!(deleted[0].sync_state, SyncState::DeletedDirty);
}

#[tokio::test(flavor = "multi_thread")]
async fn task_purge_removes_only_synced_deletions() {
    let db = setup_db().await;
    let tasks = db.tasks();

    tasks
        .insert_all(&[
            make_task("tasklive", "list0001", "Live"),
            make_task("taskdirt", "list0001", "Deleted dirty"),
            make_task("taskgone", "list0001", "Deleted clean"),
        ])
        .await
        .unwrap();
    tasks.mark_deleted("taskdirt").await.unwrap();
    tasks.mark_deleted("taskgone").await.unwrap();
    tasks.mark_synced("taskgone").await.unwrap();

    let purged = tasks.purge_synced_deletions().await.expect("Purge should succeed");
    assert_eq!(purged, 1);

    let deleted: Vec<String> = tasks
        .list_deleted()
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(deleted, vec!["taskdirt"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn task_update_marks_unsynced() {
    let db = setup_db().await;
    let tasks = db.tasks();

    let mut task = make_task("task0001", "list0001", "Buy milk");
    task.sync_state = SyncState::Clean;
    tasks.insert(&task).await.unwrap();
    assert!(tasks.list_unsynced().await.unwrap().is_empty());

    task.title = "Buy oat milk".to_string();
    task.updated_at = "2025-01-02 00:00:00".to_string();
    assert_eq!(tasks.update(&task).await.unwrap(), 1);

    let unsynced = tasks.list_unsynced().await.unwrap();
    assert_eq!(unsynced.len(), 1);
    assert_eq!(unsynced[0].title, "Buy oat milk");
}

#[tokio::test(flavor = "multi_thread")]
async fn task_update_with_identical_values_still_marks_unsynced() {
    let db = setup_db().await;
    let tasks = db.tasks();

    let mut task = make_task("task0001", "list0001", "Buy milk");
    task.sync_state = SyncState::Clean;
    tasks.insert(&task).await.unwrap();

    assert_eq!(tasks.update(&task).await.expect("Update should succeed"), 1);

    let stored = tasks.get("task0001").await.unwrap().unwrap();
    assert_eq!(stored.sync_state, SyncState::Dirty);
    let unsynced = tasks.list_unsynced().await.unwrap();
    assert_eq!(unsynced.len(), 1);
    assert_eq!(unsynced[0].id, "task0001");
}

#[tokio::test(flavor = "multi_thread")]
async fn task_reminders_exclude_completed_and_deleted() {
    let db = setup_db().await;
    let tasks = db.tasks();

    let reminder = Some("2025-01-05 09:00:00".to_string());
    tasks
        .insert_all(&[
            Task {
                reminder: reminder.clone(),
                ..make_task("taskrem1", "list0001", "Due")
            },
            Task {
                reminder: reminder.clone(),
                completed: true,
                ..make_task("taskrem2", "list0001", "Done")
            },
            Task {
                reminder: reminder.clone(),
                ..make_task("taskrem3", "list0001", "Deleted")
            },
            make_task("tasknone", "list0001", "No reminder"),
        ])
        .await
        .unwrap();
    tasks.mark_deleted("taskrem3").await.unwrap();

    let ids: Vec<String> = tasks
        .list_with_reminders()
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(ids, vec!["taskrem1"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn task_delete_by_list_includes_soft_deleted() {
    let db = setup_db().await;
    let tasks = db.tasks();

    tasks
        .insert_all(&[
            make_task("task0001", "list0001", "One"),
            make_task("task0002", "list0001", "Two"),
            make_task("task0003", "list0002", "Other list"),
        ])
        .await
        .unwrap();
    tasks.mark_deleted("task0002").await.unwrap();

    let removed = tasks.delete_by_list("list0001").await.expect("Delete should succeed");
    assert_eq!(removed, 2);
    assert_eq!(tasks.list_all().await.unwrap().len(), 1);
    assert!(tasks.list_deleted().await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn task_hard_delete_and_delete_all() {
    let db = setup_db().await;
    let tasks = db.tasks();

    tasks
        .insert_all(&[
            make_task("task0001", "list0001", "One"),
            make_task("task0002", "list0002", "Two"),
        ])
        .await
        .unwrap();

    assert_eq!(tasks.delete("task0001").await.unwrap(), 1);
    assert_eq!(tasks.delete("task0001").await.unwrap(), 0);
    assert_eq!(tasks.delete_all().await.unwrap(), 1);
    assert!(tasks.list_all().await.unwrap().is_empty());
}
