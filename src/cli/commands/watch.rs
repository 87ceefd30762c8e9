//! Follow live query results

use std::io::Write;

use crate::cli::commands::task;
use crate::cli::error::CliResult;
use crate::db::{Database, DbResult, Subscription, TaskRepository, TodoListRepository};

/// Print the lists (or the tasks of `list_id`) now and after every change.
///
/// Stops after `count` deliveries when given, otherwise on Ctrl-C.
pub async fn watch<D: Database, W: Write>(
    db: &D,
    list_id: Option<&str>,
    format: &str,
    count: Option<usize>,
    out: &mut W,
) -> CliResult<()> {
    match list_id {
        Some(id) => {
            let sub = db.tasks().watch_by_list(id);
            follow(sub, count, out, |tasks| match format {
                "json" => Ok(serde_json::to_string(tasks)?),
                _ => Ok(task::format_table(tasks)),
            })
            .await
        }
        None => {
            let sub = db.todo_lists().watch_all();
            follow(sub, count, out, |lists| match format {
                "json" => Ok(serde_json::to_string(lists)?),
                _ => Ok(lists
                    .iter()
                    .map(|l| format!("{}  {}", l.id, l.name))
                    .collect::<Vec<_>>()
                    .join("\n")),
            })
            .await
        }
    }
}

async fn follow<T, W, F>(
    mut sub: Subscription<T>,
    count: Option<usize>,
    out: &mut W,
    render: F,
) -> CliResult<()>
where
    W: Write,
    F: Fn(&T) -> CliResult<String>,
{
    let mut delivered = 0;
    loop {
        if count.is_some_and(|n| delivered >= n) {
            break;
        }

        let next: Option<DbResult<T>> = tokio::select! {
            _ = tokio::signal::ctrl_c() => None,
            next = sub.recv() => next,
        };
        let Some(result) = next else { break };

        writeln!(out, "{}", render(&result?)?)?;
        if count.is_none() {
            writeln!(out, "---")?;
        }
        out.flush()?;
        delivered += 1;
    }

    sub.cancel();
    Ok(())
}

