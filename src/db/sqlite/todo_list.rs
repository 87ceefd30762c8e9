//! SQLite TodoListRepository implementation.

use sqlx::sqlite::{SqliteQueryResult, SqliteRow};
use sqlx::{Executor, Row, Sqlite, SqlitePool};
use tracing::{debug, instrument};

use super::helpers::{db_err, total_rows};
use super::live::spawn_live_query;
use crate::db::{
    ChangeKind, ChangeNotifier, DbError, DbResult, Id, Subscription, SyncState, Table, TodoList,
    TodoListRepository,
};

const SELECT_LISTS: &str = "SELECT id, user_id, name, color, reminder, is_persistent, created_at, updated_at, is_synced, is_deleted FROM todo_lists";

/// SQLx-backed todo list repository.
pub struct SqliteTodoListRepository<'a> {
    pub(crate) pool: &'a SqlitePool,
    pub(crate) notifier: &'a ChangeNotifier,
}

impl<'a> SqliteTodoListRepository<'a> {
    /// Physical deletes on lists cascade into tasks, so both tables change.
    fn notify_deleted(&self, rows: u64) {
        if rows > 0 {
            self.notifier.touch(Table::TodoLists, ChangeKind::Delete);
            self.notifier.touch(Table::Tasks, ChangeKind::Delete);
        }
    }

    fn notify_updated(&self, rows: u64) {
        if rows > 0 {
            self.notifier.touch(Table::TodoLists, ChangeKind::Update);
        }
    }
}

impl<'a> TodoListRepository for SqliteTodoListRepository<'a> {
    #[instrument(skip(self, list), fields(list_id = %list.id))]
    async fn insert(&self, list: &TodoList) -> DbResult<()> {
        upsert_list(self.pool, list, list.sync_state)
            .await
            .map_err(db_err)?;

        self.notifier.touch(Table::TodoLists, ChangeKind::Insert);
        Ok(())
    }

    #[instrument(skip(self, lists), fields(count = lists.len()))]
    async fn insert_all(&self, lists: &[TodoList]) -> DbResult<()> {
        if lists.is_empty() {
            return Ok(());
        }

        // Transaction rolls back on drop if any row fails
        let mut tx = self.pool.begin().await.map_err(|e| DbError::Database {
            message: format!("Failed to begin transaction: {}", e),
        })?;

        for list in lists {
            upsert_list(&mut *tx, list, list.sync_state)
                .await
                .map_err(db_err)?;
        }

        tx.commit().await.map_err(db_err)?;

        self.notifier.touch(Table::TodoLists, ChangeKind::Insert);
        Ok(())
    }

    #[instrument(skip(self, list), fields(list_id = %list.id))]
    async fn update(&self, list: &TodoList) -> DbResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE todo_lists
            SET user_id = ?, name = ?, color = ?, reminder = ?, is_persistent = ?,
                created_at = ?, updated_at = ?, is_synced = 0
            WHERE id = ?
            "#,
        )
        .bind(&list.user_id)
        .bind(&list.name)
        .bind(&list.color)
        .bind(&list.reminder)
        .bind(list.is_persistent)
        .bind(&list.created_at)
        .bind(&list.updated_at)
        .bind(&list.id)
        .execute(self.pool)
        .await
        .map_err(db_err)?;

        self.notify_updated(result.rows_affected());
        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn mark_deleted(&self, id: &str) -> DbResult<u64> {
        let result =
            sqlx::query("UPDATE todo_lists SET is_deleted = 1, is_synced = 0 WHERE id = ?")
                .bind(id)
                .execute(self.pool)
                .await
                .map_err(db_err)?;

        if result.rows_affected() > 0 {
            self.notifier.touch(Table::TodoLists, ChangeKind::Delete);
        }
        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &str) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM todo_lists WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(db_err)?;

        self.notify_deleted(result.rows_affected());
        Ok(result.rows_affected())
    }

    async fn purge_synced_deletions(&self) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM todo_lists WHERE is_deleted = 1 AND is_synced = 1")
            .execute(self.pool)
            .await
            .map_err(db_err)?;

        debug!(purged = result.rows_affected(), "purged synced list deletions");
        self.notify_deleted(result.rows_affected());
        Ok(result.rows_affected())
    }

    async fn mark_synced(&self, id: &str) -> DbResult<u64> {
        let result = sqlx::query("UPDATE todo_lists SET is_synced = 1 WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(db_err)?;

        self.notify_updated(result.rows_affected());
        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn delete_all(&self) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM todo_lists")
            .execute(self.pool)
            .await
            .map_err(db_err)?;

        self.notify_deleted(result.rows_affected());
        Ok(result.rows_affected())
    }

    async fn list(&self) -> DbResult<Vec<TodoList>> {
        fetch_active_lists(self.pool).await
    }

    async fn get(&self, id: &str) -> DbResult<Option<TodoList>> {
        let row = sqlx::query(&format!("{} WHERE id = ? AND is_deleted = 0", SELECT_LISTS))
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(db_err)?;

        Ok(row.as_ref().map(row_to_list))
    }

    async fn list_unsynced(&self) -> DbResult<Vec<TodoList>> {
        fetch_unsynced_lists(self.pool).await.map_err(db_err)
    }

    async fn list_deleted(&self) -> DbResult<Vec<TodoList>> {
        fetch_lists(self.pool, &format!("{} WHERE is_deleted = 1", SELECT_LISTS)).await
    }

    async fn list_with_reminders(&self) -> DbResult<Vec<TodoList>> {
        fetch_lists(
            self.pool,
            &format!(
                "{} WHERE reminder IS NOT NULL AND is_deleted = 0 ORDER BY created_at DESC",
                SELECT_LISTS
            ),
        )
        .await
    }

    fn watch_all(&self) -> Subscription<Vec<TodoList>> {
        spawn_live_query(
            self.pool.clone(),
            self.notifier,
            &[Table::TodoLists],
            |pool| async move { fetch_active_lists(&pool).await },
        )
    }
}

/// Insert or fully overwrite a list row without deleting it first, so the
/// conflict path never cascades into the list's tasks.
pub(crate) async fn upsert_list<'e, E>(
    executor: E,
    list: &TodoList,
    state: SyncState,
) -> sqlx::Result<SqliteQueryResult>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO todo_lists (id, user_id, name, color, reminder, is_persistent, created_at, updated_at, is_synced, is_deleted)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            user_id = excluded.user_id,
            name = excluded.name,
            color = excluded.color,
            reminder = excluded.reminder,
            is_persistent = excluded.is_persistent,
            created_at = excluded.created_at,
            updated_at = excluded.updated_at,
            is_synced = excluded.is_synced,
            is_deleted = excluded.is_deleted
        "#,
    )
    .bind(&list.id)
    .bind(&list.user_id)
    .bind(&list.name)
    .bind(&list.color)
    .bind(&list.reminder)
    .bind(list.is_persistent)
    .bind(&list.created_at)
    .bind(&list.updated_at)
    .bind(state.is_synced())
    .bind(state.is_deleted())
    .execute(executor)
    .await
}

/// Mark pushed lists synced, but only rows still live and unchanged since
/// the push snapshot. Anything edited or deleted meanwhile stays dirty.
pub(crate) async fn mark_lists_synced(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    lists: &[TodoList],
) -> sqlx::Result<u64> {
    let mut counts = Vec::with_capacity(lists.len());
    for list in lists {
        let result = sqlx::query(
            r#"
            UPDATE todo_lists SET is_synced = 1
            WHERE id = ? AND is_deleted = 0
              AND user_id = ? AND name = ? AND color = ? AND reminder IS ?
              AND is_persistent = ? AND created_at = ? AND updated_at = ?
            "#,
        )
        .bind(&list.id)
        .bind(&list.user_id)
        .bind(&list.name)
        .bind(&list.color)
        .bind(&list.reminder)
        .bind(list.is_persistent)
        .bind(&list.created_at)
        .bind(&list.updated_at)
        .execute(&mut **tx)
        .await?;
        counts.push(result.rows_affected());
    }
    Ok(total_rows(counts))
}

/// Mark pushed list deletions synced. Rows are still soft-deleted or the
/// update is skipped.
pub(crate) async fn mark_deleted_lists_synced(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    ids: &[Id],
) -> sqlx::Result<u64> {
    let mut counts = Vec::with_capacity(ids.len());
    for id in ids {
        let result =
            sqlx::query("UPDATE todo_lists SET is_synced = 1 WHERE id = ? AND is_deleted = 1")
                .bind(id)
                .execute(&mut **tx)
                .await?;
        counts.push(result.rows_affected());
    }
    Ok(total_rows(counts))
}

/// Live lists with unpropagated edits.
pub(crate) async fn fetch_unsynced_lists<'e, E>(executor: E) -> sqlx::Result<Vec<TodoList>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query(&format!(
        "{} WHERE is_synced = 0 AND is_deleted = 0",
        SELECT_LISTS
    ))
    .fetch_all(executor)
    .await?;

    Ok(rows.iter().map(row_to_list).collect())
}

/// All live lists, newest first.
pub(crate) async fn fetch_active_lists(pool: &SqlitePool) -> DbResult<Vec<TodoList>> {
    fetch_lists(
        pool,
        &format!("{} WHERE is_deleted = 0 ORDER BY created_at DESC", SELECT_LISTS),
    )
    .await
}

async fn fetch_lists(pool: &SqlitePool, sql: &str) -> DbResult<Vec<TodoList>> {
    let rows = sqlx::query(sql)
        .fetch_all(pool)
        .await
        .map_err(db_err)?;

    Ok(rows.iter().map(row_to_list).collect())
}

/// Convert a database row to a TodoList model.
fn row_to_list(row: &SqliteRow) -> TodoList {
    TodoList {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        color: row.get("color"),
        reminder: row.get("reminder"),
        is_persistent: row.get("is_persistent"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        sync_state: SyncState::from_flags(row.get("is_synced"), row.get("is_deleted")),
    }
}
