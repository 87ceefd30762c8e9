//! Tests for SqliteSyncRepository.

use crate::db::{
    Database, RemoteChanges, SqliteDatabase, SyncRepository, SyncState, Task, TaskRepository,
    TodoList, TodoListRepository, User, UserRepository,
};

async fn setup_db() -> SqliteDatabase {
    let db = SqliteDatabase::in_memory()
        .await
        .expect("Failed to create in-memory database");
    db.migrate().await.expect("Migration should succeed");
    db
}

fn make_list(id: &str) -> TodoList {
    TodoList::new(id, "user0001", format!("List {}", id), "2025-01-01 00:00:00")
}

fn make_task(id: &str, list_id: &str) -> Task {
    Task::new(id, list_id, format!("Task {}", id), "2025-01-01 00:00:00")
}

#[tokio::test(flavor = "multi_thread")]
async fn pending_changes_on_empty_database() {
    let db = setup_db().await;

    let pending = db.sync().pending_changes().await.expect("Query should succeed");
    assert!(pending.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn pending_changes_collects_dirty_and_deleted_rows() {
    let db = setup_db().await;
    let lists = db.todo_lists();
    let tasks = db.tasks();

    let mut clean = make_list("listcln1");
    clean.sync_state = SyncState::Clean;
    lists
        .insert_all(&[clean, make_list("listdrt1"), make_list("listdel1")])
        .await
        .unwrap();
    tasks
        .insert_all(&[make_task("taskdrt1", "listcln1"), make_task("taskdel1", "listcln1")])
        .await
        .unwrap();
    lists.mark_deleted("listdel1").await.unwrap();
    tasks.mark_deleted("taskdel1").await.unwrap();

    let pending = db.sync().pending_changes().await.expect("Query should succeed");

    let list_ids: Vec<&str> = pending.lists.iter().map(|l| l.id.as_str()).collect();
    assert_eq!(list_ids, vec!["listdrt1"]);
    let task_ids: Vec<&str> = pending.tasks.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(task_ids, vec!["taskdrt1"]);
    assert_eq!(pending.deleted_list_ids, vec!["listdel1"]);
    assert_eq!(pending.deleted_task_ids, vec!["taskdel1"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn acknowledge_marks_synced_and_purges_deletions() {
    let db = setup_db().await;
    let lists = db.todo_lists();
    let tasks = db.tasks();

    lists
        .insert_all(&[make_list("list0001"), make_list("listdel1")])
        .await
        .unwrap();
    tasks
        .insert_all(&[make_task("task0001", "list0001"), make_task("taskdel1", "list0001")])
        .await
        .unwrap();
    lists.mark_deleted("listdel1").await.unwrap();
    tasks.mark_deleted("taskdel1").await.unwrap();

    let sync = db.sync();
    let pending = sync.pending_changes().await.unwrap();
    let summary = sync.acknowledge(&pending).await.expect("Acknowledge should succeed");

    assert_eq!(summary.marked_synced, 4);
    assert_eq!(summary.purged_lists, 1);
    assert_eq!(summary.purged_tasks, 1);

    assert!(sync.pending_changes().await.unwrap().is_empty());
    assert!(lists.list_deleted().await.unwrap().is_empty());
    assert!(tasks.list_deleted().await.unwrap().is_empty());
    assert_eq!(
        lists.get("list0001").await.unwrap().unwrap().sync_state,
        SyncState::Clean
    );
    assert_eq!(
        tasks.get("task0001").await.unwrap().unwrap().sync_state,
        SyncState::Clean
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn acknowledge_leaves_rows_it_was_not_given() {
    let db = setup_db().await;
    let lists = db.todo_lists();

    lists.insert(&make_list("list0001")).await.unwrap();
    let sync = db.sync();
    let pending = sync.pending_changes().await.unwrap();

    // Edited after the snapshot was taken.
    lists.insert(&make_list("list0002")).await.unwrap();
    sync.acknowledge(&pending).await.unwrap();

    let unsynced: Vec<String> = lists
        .list_unsynced()
        .await
        .unwrap()
        .into_iter()
        .map(|l| l.id)
        .collect();
    assert_eq!(unsynced, vec!["list0002"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn acknowledge_keeps_deletion_made_after_snapshot() {
    let db = setup_db().await;
    let lists = db.todo_lists();

    lists.insert(&make_list("list0001")).await.unwrap();
    let sync = db.sync();
    let pending = sync.pending_changes().await.unwrap();

    lists.mark_deleted("list0001").await.unwrap();
    let summary = sync.acknowledge(&pending).await.expect("Acknowledge should succeed");

    assert_eq!(summary.marked_synced, 0);
    assert_eq!(summary.purged_lists, 0);
    let deleted = lists.list_deleted().await.unwrap();
    assert_eq!(deleted.len(), 1);
    assert_eq!(deleted[0].sync_state, SyncState::DeletedDirty);

    let next = sync.pending_changes().await.unwrap();
    assert_eq!(next.deleted_list_ids, vec!["list0001"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn acknowledge_keeps_edit_made_after_snapshot() {
    let db = setup_db().await;
    let lists = db.todo_lists();

    let mut list = make_list("list0001");
    lists.insert(&list).await.unwrap();
    let sync = db.sync();
    let pending = sync.pending_changes().await.unwrap();

    list.name = "Renamed".to_string();
    list.updated_at = "2025-01-02 00:00:00".to_string();
    lists.update(&list).await.unwrap();
    sync.acknowledge(&pending).await.expect("Acknowledge should succeed");

    let stored = lists.get("list0001").await.unwrap().unwrap();
    assert_eq!(stored.name, "Renamed");
    assert_eq!(stored.sync_state, SyncState::Dirty);
}

#[tokio::test(flavor = "multi_thread")]
async fn acknowledge_keeps_task_changes_made_after_snapshot() {
    let db = setup_db().await;
    let tasks = db.tasks();

    db.todo_lists().insert(&make_list("list0001")).await.unwrap();
    tasks
        .insert_all(&[
            make_task("taskmove", "list0001"),
            make_task("taskgone", "list0001"),
            make_task("taskkeep", "list0001"),
        ])
        .await
        .unwrap();
    let sync = db.sync();
    let pending = sync.pending_changes().await.unwrap();

    // Moving a task leaves updated_at untouched.
    tasks.reposition("taskmove", 5).await.unwrap();
    tasks.mark_deleted("taskgone").await.unwrap();
    let summary = sync.acknowledge(&pending).await.expect("Acknowledge should succeed");

    assert_eq!(summary.purged_tasks, 0);
    assert_eq!(
        tasks.get("taskmove").await.unwrap().unwrap().sync_state,
        SyncState::Dirty
    );
    assert_eq!(
        tasks.get("taskkeep").await.unwrap().unwrap().sync_state,
        SyncState::Clean
    );
    let deleted = tasks.list_deleted().await.unwrap();
    assert_eq!(deleted.len(), 1);
    assert_eq!(deleted[0].sync_state, SyncState::DeletedDirty);
}

#[tokio::test(flavor = "multi_thread")]
async fn apply_remote_stores_rows_as_clean() {
    let db = setup_db().await;

    let changes = RemoteChanges {
        lists: vec![make_list("listrem1")],
        tasks: vec![make_task("taskrem1", "listrem1")],
        ..Default::default()
    };
    let summary = db.sync().apply_remote(&changes).await.expect("Apply should succeed");
    assert_eq!(summary.lists_upserted, 1);
    assert_eq!(summary.tasks_upserted, 1);

    let list = db.todo_lists().get("listrem1").await.unwrap().unwrap();
    assert_eq!(list.sync_state, SyncState::Clean);
    let task = db.tasks().get("taskrem1").await.unwrap().unwrap();
    assert_eq!(task.sync_state, SyncState::Clean);
    assert!(db.sync().pending_changes().await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn apply_remote_overwrites_local_and_applies_deletions() {
    let db = setup_db().await;
    let lists = db.todo_lists();
    let tasks = db.tasks();

    lists
        .insert_all(&[make_list("list0001"), make_list("list0002")])
        .await
        .unwrap();
    tasks
        .insert_all(&[make_task("task0001", "list0001"), make_task("task0002", "list0002")])
        .await
        .unwrap();

    let mut renamed = make_list("list0001");
    renamed.name = "Renamed remotely".to_string();
    let changes = RemoteChanges {
        lists: vec![renamed],
        deleted_list_ids: vec!["list0002".to_string()],
        deleted_task_ids: vec!["task0001".to_string()],
        ..Default::default()
    };
    let summary = db.sync().apply_remote(&changes).await.unwrap();
    assert_eq!(summary.lists_deleted, 1);
    assert_eq!(summary.tasks_deleted, 1);

    assert_eq!(
        lists.get("list0001").await.unwrap().unwrap().name,
        "Renamed remotely"
    );
    assert!(lists.get("list0002").await.unwrap().is_none());
    assert!(tasks.list_all().await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn apply_remote_rolls_back_on_orphan_task() {
    let db = setup_db().await;

    let changes = RemoteChanges {
        lists: vec![make_list("listrem1")],
        tasks: vec![make_task("taskrem1", "nolist01")],
        ..Default::default()
    };
    assert!(db.sync().apply_remote(&changes).await.is_err());
    assert!(db.todo_lists().list().await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn clear_all_removes_everything() {
    let db = setup_db().await;

    db.users()
        .insert(&User {
            id: "user0001".to_string(),
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
            created_at: "2025-01-01 00:00:00".to_string(),
        })
        .await
        .unwrap();
    db.todo_lists().insert(&make_list("list0001")).await.unwrap();
    db.tasks().insert(&make_task("task0001", "list0001")).await.unwrap();

    db.sync().clear_all().await.expect("Clear should succeed");

    assert!(db.users().current().await.unwrap().is_none());
    assert!(db.todo_lists().list().await.unwrap().is_empty());
    assert!(db.tasks().list_all().await.unwrap().is_empty());
}
