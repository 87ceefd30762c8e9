//! Shared helper functions for SQLite repositories.

use sqlx::error::ErrorKind;

use crate::db::DbError;

/// Map a driver error onto the storage-agnostic error type.
///
/// Constraint failures (foreign key, unique, not-null, check) become
/// `DbError::Constraint`; everything else is `DbError::Database`.
pub(crate) fn db_err(e: sqlx::Error) -> DbError {
    if let sqlx::Error::Database(db) = &e {
        let is_constraint = matches!(
            db.kind(),
            ErrorKind::ForeignKeyViolation
                | ErrorKind::UniqueViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::CheckViolation
        ) || db.message().contains("constraint failed");

        if is_constraint {
            return DbError::Constraint {
                message: db.message().to_string(),
            };
        }
    }

    DbError::Database {
        message: e.to_string(),
    }
}

/// Add affected-row counts, as returned by per-row statements in a batch.
pub(crate) fn total_rows(counts: impl IntoIterator<Item = u64>) -> u64 {
    counts.into_iter().sum()
}
