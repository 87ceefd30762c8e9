//! Task CLI commands

use serde::Serialize;
use tabled::{Table, Tabled};

use crate::cli::error::{CliError, CliResult};
use crate::cli::utils::{apply_table_style, format_optional, format_sync_state, truncate_with_ellipsis};
use crate::db::utils::{current_timestamp, generate_entity_id};
use crate::db::{Database, Task, TaskRepository, TodoList, TodoListRepository};

#[derive(Tabled)]
pub(crate) struct TaskDisplay {
    #[tabled(rename = "ID")]
    pub(crate) id: String,
    #[tabled(rename = "Title")]
    pub(crate) title: String,
    #[tabled(rename = "Done")]
    pub(crate) completed: String,
    #[tabled(rename = "Pos")]
    pub(crate) position: i32,
    #[tabled(rename = "Reminder")]
    pub(crate) reminder: String,
    #[tabled(rename = "Sync")]
    pub(crate) sync: String,
}

impl From<&Task> for TaskDisplay {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.clone(),
            title: truncate_with_ellipsis(&task.title, 50),
            completed: if task.completed { "✓" } else { "" }.to_string(),
            position: task.position,
            reminder: format_optional(task.reminder.as_deref()),
            sync: format_sync_state(task.sync_state),
        }
    }
}

pub(crate) fn format_table(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return "No tasks found.".to_string();
    }

    let display: Vec<TaskDisplay> = tasks.iter().map(TaskDisplay::from).collect();
    let mut table = Table::new(display);
    apply_table_style(&mut table);
    table.to_string()
}

/// List the live tasks of a list in display order
pub async fn list_tasks<D: Database>(db: &D, list_id: &str, format: &str) -> CliResult<String> {
    let tasks = db.tasks().list_by_list(list_id).await?;

    match format {
        "json" => Ok(serde_json::to_string_pretty(&tasks)?),
        _ => Ok(format_table(&tasks)),
    }
}

/// Options for a new task
#[derive(Debug, Default)]
pub struct NewTask<'a> {
    pub list_id: &'a str,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub reminder: Option<&'a str>,
    pub position: Option<i32>,
}

/// Add a task to a live list
pub async fn add_task<D: Database>(db: &D, new: NewTask<'_>) -> CliResult<String> {
    if db.todo_lists().get(new.list_id).await?.is_none() {
        return Err(CliError::NotFound {
            kind: "List",
            id: new.list_id.to_string(),
        });
    }

    let mut task = Task::new(generate_entity_id(), new.list_id, new.title, current_timestamp());
    task.description = new.description.map(str::to_string);
    task.reminder = new.reminder.map(str::to_string);
    task.position = new.position.unwrap_or_default();

    db.tasks().insert(&task).await?;

    Ok(format!("✓ Created task: {} ({})", task.title, task.id))
}

/// Mark a task complete, or incomplete again with `undo`
pub async fn complete_task<D: Database>(db: &D, id: &str, undo: bool) -> CliResult<String> {
    let affected = db
        .tasks()
        .set_completed(id, !undo, &current_timestamp())
        .await?;
    if affected == 0 {
        return Err(CliError::NotFound {
            kind: "Task",
            id: id.to_string(),
        });
    }

    if undo {
        Ok(format!("✓ Reopened task: {}", id))
    } else {
        Ok(format!("✓ Completed task: {}", id))
    }
}

/// Soft-delete a task
pub async fn remove_task<D: Database>(db: &D, id: &str) -> CliResult<String> {
    let affected = db.tasks().mark_deleted(id).await?;
    if affected == 0 {
        return Err(CliError::NotFound {
            kind: "Task",
            id: id.to_string(),
        });
    }

    Ok(format!("✓ Deleted task: {}", id))
}

#[derive(Debug, Serialize)]
struct Reminders {
    lists: Vec<TodoList>,
    tasks: Vec<Task>,
}

/// Everything a notification scheduler would pick up
pub async fn list_reminders<D: Database>(db: &D, format: &str) -> CliResult<String> {
    let reminders = Reminders {
        lists: db.todo_lists().list_with_reminders().await?,
        tasks: db.tasks().list_with_reminders().await?,
    };

    if format == "json" {
        return Ok(serde_json::to_string_pretty(&reminders)?);
    }

    if reminders.lists.is_empty() && reminders.tasks.is_empty() {
        return Ok("No reminders set.".to_string());
    }

    let mut lines = Vec::new();
    for list in &reminders.lists {
        lines.push(format!(
            "{}  list  {}",
            format_optional(list.reminder.as_deref()),
            list.name
        ));
    }
    for task in &reminders.tasks {
        lines.push(format!(
            "{}  task  {}",
            format_optional(task.reminder.as_deref()),
            task.title
        ));
    }
    Ok(lines.join("\n"))
}
