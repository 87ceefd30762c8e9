//! Sync bookkeeping CLI commands

use serde_json::json;

use crate::cli::error::CliResult;
use crate::db::{Database, SyncRepository, TaskRepository, TodoListRepository};

/// Show what the next push would send
pub async fn pending<D: Database>(db: &D, format: &str) -> CliResult<String> {
    let pending = db.sync().pending_changes().await?;

    match format {
        "json" => Ok(serde_json::to_string_pretty(&pending)?),
        _ => {
            if pending.is_empty() {
                return Ok("Nothing to sync.".to_string());
            }
            Ok(format!(
                "Lists to push:    {}\nTasks to push:    {}\nDeleted lists:    {}\nDeleted tasks:    {}",
                pending.lists.len(),
                pending.tasks.len(),
                pending.deleted_list_ids.len(),
                pending.deleted_task_ids.len()
            ))
        }
    }
}

/// Physically remove rows whose deletion has already been synced
pub async fn purge<D: Database>(db: &D, format: &str) -> CliResult<String> {
    // Tasks first so cascaded rows are not counted twice.
    let purged_tasks = db.tasks().purge_synced_deletions().await?;
    let purged_lists = db.todo_lists().purge_synced_deletions().await?;

    match format {
        "json" => Ok(serde_json::to_string_pretty(&json!({
            "purged_lists": purged_lists,
            "purged_tasks": purged_tasks,
        }))?),
        _ => Ok(format!(
            "✓ Purged {} lists and {} tasks",
            purged_lists, purged_tasks
        )),
    }
}
