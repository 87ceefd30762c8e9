//! SQLite UserRepository implementation.

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::instrument;

use super::helpers::db_err;
use crate::db::{ChangeKind, ChangeNotifier, DbResult, Table, User, UserRepository};

/// SQLx-backed user repository.
pub struct SqliteUserRepository<'a> {
    pub(crate) pool: &'a SqlitePool,
    pub(crate) notifier: &'a ChangeNotifier,
}

impl<'a> UserRepository for SqliteUserRepository<'a> {
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn insert(&self, user: &User) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                username = excluded.username,
                email = excluded.email,
                created_at = excluded.created_at
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.created_at)
        .execute(self.pool)
        .await
        .map_err(db_err)?;

        self.notifier.touch(Table::Users, ChangeKind::Insert);
        Ok(())
    }

    async fn get(&self, id: &str) -> DbResult<Option<User>> {
        let row = sqlx::query("SELECT id, username, email, created_at FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(db_err)?;

        Ok(row.as_ref().map(row_to_user))
    }

    async fn current(&self) -> DbResult<Option<User>> {
        let row = sqlx::query("SELECT id, username, email, created_at FROM users LIMIT 1")
            .fetch_optional(self.pool)
            .await
            .map_err(db_err)?;

        Ok(row.as_ref().map(row_to_user))
    }

    #[instrument(skip(self))]
    async fn delete_all(&self) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM users")
            .execute(self.pool)
            .await
            .map_err(db_err)?;

        if result.rows_affected() > 0 {
            self.notifier.touch(Table::Users, ChangeKind::Delete);
        }
        Ok(result.rows_affected())
    }
}

fn row_to_user(row: &SqliteRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        created_at: row.get("created_at"),
    }
}
