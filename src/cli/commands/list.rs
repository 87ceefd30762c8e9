//! Todo list CLI commands

use serde::Serialize;
use tabled::{Table, Tabled};

use crate::cli::error::{CliError, CliResult};
use crate::cli::utils::{apply_table_style, format_optional, format_sync_state, truncate_with_ellipsis};
use crate::db::utils::{current_timestamp, generate_entity_id};
use crate::db::{Database, TaskRepository, TodoList, TodoListRepository, UserRepository};

/// A list together with its progress counters.
#[derive(Debug, Serialize)]
pub(crate) struct ListSummary {
    #[serde(flatten)]
    pub(crate) list: TodoList,
    pub(crate) task_count: i64,
    pub(crate) completed_count: i64,
}

#[derive(Tabled)]
pub(crate) struct ListDisplay {
    #[tabled(rename = "ID")]
    pub(crate) id: String,
    #[tabled(rename = "Name")]
    pub(crate) name: String,
    #[tabled(rename = "Color")]
    pub(crate) color: String,
    #[tabled(rename = "Done")]
    pub(crate) progress: String,
    #[tabled(rename = "Reminder")]
    pub(crate) reminder: String,
    #[tabled(rename = "Sync")]
    pub(crate) sync: String,
}

impl From<&ListSummary> for ListDisplay {
    fn from(summary: &ListSummary) -> Self {
        let list = &summary.list;
        Self {
            id: list.id.clone(),
            name: truncate_with_ellipsis(&list.name, 40),
            color: list.color.clone(),
            progress: format!("{}/{}", summary.completed_count, summary.task_count),
            reminder: format_optional(list.reminder.as_deref()),
            sync: format_sync_state(list.sync_state),
        }
    }
}

pub(crate) fn format_table(lists: &[ListSummary]) -> String {
    if lists.is_empty() {
        return "No lists found.".to_string();
    }

    let display: Vec<ListDisplay> = lists.iter().map(ListDisplay::from).collect();
    let mut table = Table::new(display);
    apply_table_style(&mut table);
    table.to_string()
}

/// List every live list with task progress
pub async fn list_lists<D: Database>(db: &D, format: &str) -> CliResult<String> {
    let lists = db.todo_lists().list().await?;
    let tasks = db.tasks();

    let mut summaries = Vec::with_capacity(lists.len());
    for list in lists {
        let task_count = tasks.count_by_list(&list.id).await?;
        let completed_count = tasks.count_completed_by_list(&list.id).await?;
        summaries.push(ListSummary {
            list,
            task_count,
            completed_count,
        });
    }

    match format {
        "json" => Ok(serde_json::to_string_pretty(&summaries)?),
        _ => Ok(format_table(&summaries)),
    }
}

/// Options for a new list
#[derive(Debug, Default)]
pub struct NewList<'a> {
    pub name: &'a str,
    pub user_id: Option<&'a str>,
    pub color: Option<&'a str>,
    pub reminder: Option<&'a str>,
    pub persistent: bool,
}

/// Create a list owned by `user_id` or the signed-in user
pub async fn add_list<D: Database>(db: &D, new: NewList<'_>) -> CliResult<String> {
    let user_id = match new.user_id {
        Some(id) => id.to_string(),
        None => db.users().current().await?.ok_or(CliError::NoUser)?.id,
    };

    let mut list = TodoList::new(generate_entity_id(), user_id, new.name, current_timestamp());
    if let Some(color) = new.color {
        list.color = color.to_string();
    }
    list.reminder = new.reminder.map(str::to_string);
    list.is_persistent = new.persistent;

    db.todo_lists().insert(&list).await?;

    Ok(format!("✓ Created list: {} ({})", list.name, list.id))
}

/// Soft-delete a list so the deletion is pushed on the next sync
pub async fn remove_list<D: Database>(db: &D, id: &str) -> CliResult<String> {
    let affected = db.todo_lists().mark_deleted(id).await?;
    if affected == 0 {
        return Err(CliError::NotFound {
            kind: "List",
            id: id.to_string(),
        });
    }

    Ok(format!("✓ Deleted list: {}", id))
}
