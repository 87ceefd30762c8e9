use crate::cli::commands::task::*;
use crate::cli::error::CliError;
use crate::db::{Database, SqliteDatabase, Task, TaskRepository, TodoList, TodoListRepository};

async fn setup_db() -> SqliteDatabase {
    let db = SqliteDatabase::in_memory()
        .await
        .expect("Failed to create test database");
    db.migrate().await.expect("Failed to run migrations");
    db.todo_lists()
        .insert(&TodoList::new("list0001", "user0001", "Errands", "2025-01-01 00:00:00"))
        .await
        .expect("Failed to create test list");
    db
}

#[test]
fn test_format_table_empty() {
    assert_eq!(format_table(&[]), "No tasks found.");
}

#[test]
fn test_format_table_marks_completed() {
    let task = Task {
        completed: true,
        ..Task::new("task0001", "list0001", "Post office", "2025-01-01 00:00:00")
    };

    let output = format_table(&[task]);
    assert!(output.contains("Post office"));
    assert!(output.contains("✓"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_add_task_and_list_json() {
    let db = setup_db().await;

    let output = add_task(
        &db,
        NewTask {
            list_id: "list0001",
            title: "Bank",
            description: Some("Deposit cheque"),
            position: Some(2),
            ..Default::default()
        },
    )
    .await
    .expect("Add task should succeed");
    assert!(output.starts_with("✓ Created task: Bank ("));

    let json = list_tasks(&db, "list0001", "json").await.unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed[0]["title"], "Bank");
    assert_eq!(parsed[0]["description"], "Deposit cheque");
    assert_eq!(parsed[0]["position"], 2);
    assert_eq!(parsed[0]["completed"], false);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_add_task_to_missing_list_fails() {
    let db = setup_db().await;

    let result = add_task(
        &db,
        NewTask {
            list_id: "nonexist",
            title: "Orphan",
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(result, Err(CliError::NotFound { kind: "List", .. })));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_complete_and_reopen_task() {
    let db = setup_db().await;
    db.tasks()
        .insert(&Task::new("task0001", "list0001", "Bank", "2025-01-01 00:00:00"))
        .await
        .unwrap();

    let output = complete_task(&db, "task0001", false).await.unwrap();
    assert_eq!(output, "✓ Completed task: task0001");
    assert!(db.tasks().get("task0001").await.unwrap().unwrap().completed);

    let output = complete_task(&db, "task0001", true).await.unwrap();
    assert_eq!(output, "✓ Reopened task: task0001");
    assert!(!db.tasks().get("task0001").await.unwrap().unwrap().completed);

    let missing = complete_task(&db, "nonexist", false).await;
    assert!(matches!(missing, Err(CliError::NotFound { kind: "Task", .. })));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_remove_task_hides_it() {
    let db = setup_db().await;
    db.tasks()
        .insert(&Task::new("task0001", "list0001", "Bank", "2025-01-01 00:00:00"))
        .await
        .unwrap();

    remove_task(&db, "task0001").await.expect("Remove should succeed");

    let output = list_tasks(&db, "list0001", "table").await.unwrap();
    assert_eq!(output, "No tasks found.");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_list_reminders() {
    let db = setup_db().await;

    let empty = list_reminders(&db, "table").await.unwrap();
    assert_eq!(empty, "No reminders set.");

    db.tasks()
        .insert(&Task {
            reminder: Some("2025-01-02 09:00:00".to_string()),
            ..Task::new("task0001", "list0001", "Bank", "2025-01-01 00:00:00")
        })
        .await
        .unwrap();

    let output = list_reminders(&db, "table").await.unwrap();
    assert_eq!(output, "2025-01-02 09:00:00  task  Bank");

    let json = list_reminders(&db, "json").await.unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["tasks"][0]["id"], "task0001");
    assert_eq!(parsed["lists"].as_array().map(Vec::len), Some(0));
}
