use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::db::DbError;

#[derive(Error, Diagnostic, Debug)]
pub enum CliError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Database(#[from] DbError),

    #[error("Failed to create data directory {}", path.display())]
    #[diagnostic(
        code(todo_store::cli::data_dir),
        help("Pass --db with a writable path or set TODO_STORE_DATA_DIR.")
    )]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{kind} not found: {id}")]
    #[diagnostic(code(todo_store::cli::not_found))]
    NotFound { kind: &'static str, id: String },

    #[error("No signed-in user")]
    #[diagnostic(
        code(todo_store::cli::no_user),
        help("Pass --user <id> to choose the owner of the new list.")
    )]
    NoUser,

    #[error("Failed to write output: {message}")]
    #[diagnostic(code(todo_store::cli::output))]
    Output { message: String },
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Output {
            message: e.to_string(),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Output {
            message: e.to_string(),
        }
    }
}

pub type CliResult<T> = Result<T, CliError>;
