mod commands;
pub mod error;
mod utils;


use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::get_db_path;
use crate::db::{Database, SqliteDatabase};
use commands::list::NewList;
use commands::task::NewTask;
use error::{CliError, CliResult};

#[derive(Parser)]
#[command(name = "todo-store")]
#[command(author, version, about = "Inspect and edit the local to-do store", long_about = None)]
pub struct Cli {
    /// Database file path (default: TODO_STORE_DATA_DIR or ~/.local/share/todo-store/todo.db)
    #[arg(long, global = true, env = "TODO_STORE_DB")]
    pub db: Option<PathBuf>,

    /// Output format (table or json)
    #[arg(long, global = true, default_value = "table")]
    pub format: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the schema and show row counts
    Check,
    /// List all live lists
    Lists,
    /// List the tasks of a list
    Tasks {
        /// List ID
        list_id: String,
    },
    /// Show lists and tasks that carry a reminder
    Reminders,
    /// Create a list
    AddList {
        /// List name
        name: String,
        /// Owner (defaults to the signed-in user)
        #[arg(long)]
        user: Option<String>,
        /// Hex color, e.g. #3B82F6
        #[arg(long)]
        color: Option<String>,
        /// Reminder timestamp
        #[arg(long)]
        reminder: Option<String>,
        /// Keep a persistent notification for this list
        #[arg(long)]
        persistent: bool,
    },
    /// Add a task to a list
    AddTask {
        /// List ID
        list_id: String,
        /// Task title
        title: String,
        #[arg(short, long)]
        description: Option<String>,
        /// Reminder timestamp
        #[arg(long)]
        reminder: Option<String>,
        /// Manual ordering position
        #[arg(long)]
        position: Option<i32>,
    },
    /// Mark a task as complete
    Complete {
        /// Task ID
        id: String,
        /// Mark the task incomplete again
        #[arg(long)]
        undo: bool,
    },
    /// Soft-delete a list
    RemoveList {
        /// List ID
        id: String,
    },
    /// Soft-delete a task
    RemoveTask {
        /// Task ID
        id: String,
    },
    /// Show changes waiting to be pushed
    Pending,
    /// Remove deletions that were already synced
    Purge,
    /// Follow lists (or one list's tasks) as they change
    Watch {
        /// Follow the tasks of this list instead of the lists
        list_id: Option<String>,
        /// Stop after this many updates
        #[arg(long)]
        count: Option<usize>,
    },
}

/// Initialize tracing subscriber with env filter
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todo_store=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn open_database(path: Option<PathBuf>) -> CliResult<SqliteDatabase> {
    let path = path.unwrap_or_else(get_db_path);

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|source| CliError::DataDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let db = SqliteDatabase::open(&path).await?;
    db.migrate().await?;
    debug!(path = %path.display(), "database ready");
    Ok(db)
}

pub async fn run() -> CliResult<()> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        // Show help when no command provided
        let _ = Cli::parse_from(["todo-store", "--help"]);
        return Ok(());
    };

    init_tracing();
    let db = open_database(cli.db).await?;
    let format = cli.format.as_str();

    let output = match command {
        Commands::Check => commands::schema::check(&db, format).await?,
        Commands::Lists => commands::list::list_lists(&db, format).await?,
        Commands::Tasks { list_id } => commands::task::list_tasks(&db, &list_id, format).await?,
        Commands::Reminders => commands::task::list_reminders(&db, format).await?,
        Commands::AddList {
            name,
            user,
            color,
            reminder,
            persistent,
        } => {
            commands::list::add_list(
                &db,
                NewList {
                    name: &name,
                    user_id: user.as_deref(),
                    color: color.as_deref(),
                    reminder: reminder.as_deref(),
                    persistent,
                },
            )
            .await?
        }
        Commands::AddTask {
            list_id,
            title,
            description,
            reminder,
            position,
        } => {
            commands::task::add_task(
                &db,
                NewTask {
                    list_id: &list_id,
                    title: &title,
                    description: description.as_deref(),
                    reminder: reminder.as_deref(),
                    position,
                },
            )
            .await?
        }
        Commands::Complete { id, undo } => commands::task::complete_task(&db, &id, undo).await?,
        Commands::RemoveList { id } => commands::list::remove_list(&db, &id).await?,
        Commands::RemoveTask { id } => commands::task::remove_task(&db, &id).await?,
        Commands::Pending => commands::sync::pending(&db, format).await?,
        Commands::Purge => commands::sync::purge(&db, format).await?,
        Commands::Watch { list_id, count } => {
            let mut stdout = std::io::stdout();
            commands::watch::watch(&db, list_id.as_deref(), format, count, &mut stdout).await?;
            db.close().await;
            return Ok(());
        }
    };

    println!("{}", output);
    db.close().await;
    Ok(())
}
