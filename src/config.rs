//! Path resolution and connection settings.
//!
//! The data directory follows XDG conventions and can be pinned with
//! `TODO_STORE_DATA_DIR`.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Directory name under the XDG data home.
pub const APP_DIR: &str = "todo-store";

/// Database file name inside the data directory.
pub const DB_FILE_NAME: &str = "todo.db";

/// Environment variable that overrides the data directory.
pub const DATA_DIR_ENV: &str = "TODO_STORE_DATA_DIR";

/// Get the data directory.
///
/// Resolution order: `$TODO_STORE_DATA_DIR`, `$XDG_DATA_HOME/todo-store`,
/// `$HOME/.local/share/todo-store`, then `./todo-store`.
pub fn get_data_dir() -> PathBuf {
    if let Ok(dir) = env::var(DATA_DIR_ENV)
        && !dir.is_empty()
    {
        return PathBuf::from(dir);
    }

    let data_home = env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .or_else(|_| env::var("HOME").map(|home| PathBuf::from(home).join(".local/share")))
        .unwrap_or_else(|_| PathBuf::from("."));

    data_home.join(APP_DIR)
}

/// Get database file path (data_dir/todo.db).
pub fn get_db_path() -> PathBuf {
    get_data_dir().join(DB_FILE_NAME)
}

/// Connection pool settings for a file-backed database.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Upper bound on pooled connections.
    pub max_connections: u32,
    /// How long a connection waits on a locked database before failing.
    pub busy_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_connections: 5,
            busy_timeout: Duration::from_secs(5),
        }
    }
}
