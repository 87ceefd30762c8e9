//! Database error types.
//!
//! This module provides abstracted error types for database operations.
//! It uses miette for fancy diagnostic output and thiserror for derive macros.
//! The error types are storage-backend agnostic.
//!
//! A missing row is never an error: point reads return `Option` and
//! targeted writes return the number of affected rows.

use miette::Diagnostic;
use thiserror::Error;

/// Database operation errors.
#[derive(Error, Diagnostic, Debug)]
pub enum DbError {
    #[error("Database error: {message}")]
    #[diagnostic(code(todo_store::db::database_error))]
    Database { message: String },

    #[error("Migration error: {message}")]
    #[diagnostic(
        code(todo_store::db::migration_error),
        help("The database was written by a different version of this application and no migration path exists.")
    )]
    Migration { message: String },

    #[error("Connection error: {message}")]
    #[diagnostic(code(todo_store::db::connection_error))]
    Connection { message: String },

    #[error("Constraint violation: {message}")]
    #[diagnostic(code(todo_store::db::constraint))]
    Constraint { message: String },

    #[error("Schema mismatch in table '{table}'\nExpected: {expected}\nFound: {found}")]
    #[diagnostic(
        code(todo_store::db::schema_mismatch),
        help("The database file does not match the schema this build expects. Restore a compatible build or remove the file.")
    )]
    SchemaMismatch {
        table: String,
        expected: String,
        found: String,
    },
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
