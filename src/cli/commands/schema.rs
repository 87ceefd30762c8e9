//! Database health check

use serde_json::json;

use crate::cli::error::CliResult;
use crate::db::{Database, SyncRepository, TaskRepository, TodoListRepository, UserRepository};

/// Validate the schema and report row counts
pub async fn check<D: Database>(db: &D, format: &str) -> CliResult<String> {
    db.validate_schema().await?;

    let user = db.users().current().await?;
    let lists = db.todo_lists().list().await?.len();
    let tasks = db.tasks().list_all().await?.len();
    let pending = db.sync().pending_changes().await?;

    match format {
        "json" => Ok(serde_json::to_string_pretty(&json!({
            "schema": "ok",
            "user": user.as_ref().map(|u| u.username.as_str()),
            "lists": lists,
            "tasks": tasks,
            "pending": !pending.is_empty(),
        }))?),
        _ => Ok(format!(
            "✓ Schema OK\nUser:    {}\nLists:   {}\nTasks:   {}\nPending: {}",
            user.map(|u| u.username).unwrap_or_else(|| "-".to_string()),
            lists,
            tasks,
            if pending.is_empty() { "no" } else { "yes" }
        )),
    }
}
