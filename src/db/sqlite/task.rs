//! SQLite TaskRepository implementation.

use sqlx::sqlite::{SqliteQueryResult, SqliteRow};
use sqlx::{Executor, Row, Sqlite, SqlitePool};
use tracing::{debug, instrument};

use super::helpers::{db_err, total_rows};
use super::live::spawn_live_query;
use crate::db::{
    ChangeKind, ChangeNotifier, DbError, DbResult, Id, Subscription, SyncState, Table, Task,
    TaskRepository,
};

const SELECT_TASKS: &str = "SELECT id, list_id, title, description, completed, reminder, position, created_at, updated_at, is_synced, is_deleted FROM tasks";

/// Incomplete tasks first, then manual position, then newest.
const DISPLAY_ORDER: &str = "ORDER BY completed ASC, position ASC, created_at DESC";

/// SQLx-backed task repository.
pub struct SqliteTaskRepository<'a> {
    pub(crate) pool: &'a SqlitePool,
    pub(crate) notifier: &'a ChangeNotifier,
}

impl<'a> SqliteTaskRepository<'a> {
    fn notify(&self, kind: ChangeKind, rows: u64) {
        if rows > 0 {
            self.notifier.touch(Table::Tasks, kind);
        }
    }
}

impl<'a> TaskRepository for SqliteTaskRepository<'a> {
    #[instrument(skip(self, task), fields(task_id = %task.id, list_id = %task.list_id))]
    async fn insert(&self, task: &Task) -> DbResult<()> {
        upsert_task(self.pool, task, task.sync_state)
            .await
            .map_err(db_err)?;

        self.notifier.touch(Table::Tasks, ChangeKind::Insert);
        Ok(())
    }

    #[instrument(skip(self, tasks), fields(count = tasks.len()))]
    async fn insert_all(&self, tasks: &[Task]) -> DbResult<()> {
        if tasks.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.map_err(|e| DbError::Database {
            message: format!("Failed to begin transaction: {}", e),
        })?;

        for task in tasks {
            upsert_task(&mut *tx, task, task.sync_state)
                .await
                .map_err(db_err)?;
        }

        tx.commit().await.map_err(db_err)?;

        self.notifier.touch(Table::Tasks, ChangeKind::Insert);
        Ok(())
    }

    #[instrument(skip(self, task), fields(task_id = %task.id))]
    async fn update(&self, task: &Task) -> DbResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET list_id = ?, title = ?, description = ?, completed = ?, reminder = ?,
                position = ?, created_at = ?, updated_at = ?, is_synced = 0
            WHERE id = ?
            "#,
        )
        .bind(&task.list_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.completed)
        .bind(&task.reminder)
        .bind(task.position)
        .bind(&task.created_at)
        .bind(&task.updated_at)
        .bind(&task.id)
        .execute(self.pool)
        .await
        .map_err(db_err)?;

        self.notify(ChangeKind::Update, result.rows_affected());
        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn set_completed(&self, id: &str, completed: bool, updated_at: &str) -> DbResult<u64> {
        let result = sqlx::query(
            "UPDATE tasks SET completed = ?, updated_at = ?, is_synced = 0 WHERE id = ?",
        )
        .bind(completed)
        .bind(updated_at)
        .bind(id)
        .execute(self.pool)
        .await
        .map_err(db_err)?;

        self.notify(ChangeKind::Update, result.rows_affected());
        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn reposition(&self, id: &str, position: i32) -> DbResult<u64> {
        // Reordering is not a content edit: updated_at stays as it is.
        let result = sqlx::query("UPDATE tasks SET position = ?, is_synced = 0 WHERE id = ?")
            .bind(position)
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(db_err)?;

        self.notify(ChangeKind::Update, result.rows_affected());
        Ok(result.rows_affected())
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn reorder(&self, ids: &[String]) -> DbResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await.map_err(|e| DbError::Database {
            message: format!("Failed to begin transaction: {}", e),
        })?;

        let mut counts = Vec::with_capacity(ids.len());
        for (position, id) in ids.iter().enumerate() {
            let result = sqlx::query("UPDATE tasks SET position = ?, is_synced = 0 WHERE id = ?")
                .bind(position as i64)
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
            counts.push(result.rows_affected());
        }

        tx.commit().await.map_err(db_err)?;

        let updated = total_rows(counts);
        self.notify(ChangeKind::Update, updated);
        Ok(updated)
    }

    #[instrument(skip(self))]
    async fn mark_deleted(&self, id: &str) -> DbResult<u64> {
        let result = sqlx::query("UPDATE tasks SET is_deleted = 1, is_synced = 0 WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(db_err)?;

        self.notify(ChangeKind::Delete, result.rows_affected());
        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &str) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(db_err)?;

        self.notify(ChangeKind::Delete, result.rows_affected());
        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn delete_by_list(&self, list_id: &str) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM tasks WHERE list_id = ?")
            .bind(list_id)
            .execute(self.pool)
            .await
            .map_err(db_err)?;

        self.notify(ChangeKind::Delete, result.rows_affected());
        Ok(result.rows_affected())
    }

    async fn purge_synced_deletions(&self) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM tasks WHERE is_deleted = 1 AND is_synced = 1")
            .execute(self.pool)
            .await
            .map_err(db_err)?;

        debug!(purged = result.rows_affected(), "purged synced task deletions");
        self.notify(ChangeKind::Delete, result.rows_affected());
        Ok(result.rows_affected())
    }

    async fn mark_synced(&self, id: &str) -> DbResult<u64> {
        let result = sqlx::query("UPDATE tasks SET is_synced = 1 WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(db_err)?;

        self.notify(ChangeKind::Update, result.rows_affected());
        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn delete_all(&self) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM tasks")
            .execute(self.pool)
            .await
            .map_err(db_err)?;

        self.notify(ChangeKind::Delete, result.rows_affected());
        Ok(result.rows_affected())
    }

    async fn list_all(&self) -> DbResult<Vec<Task>> {
        fetch_active_tasks(self.pool).await
    }

    async fn list_by_list(&self, list_id: &str) -> DbResult<Vec<Task>> {
        fetch_tasks_by_list(self.pool, list_id).await
    }

    async fn get(&self, id: &str) -> DbResult<Option<Task>> {
        let row = sqlx::query(&format!("{} WHERE id = ? AND is_deleted = 0", SELECT_TASKS))
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(db_err)?;

        Ok(row.as_ref().map(row_to_task))
    }

    async fn list_unsynced(&self) -> DbResult<Vec<Task>> {
        fetch_unsynced_tasks(self.pool).await.map_err(db_err)
    }

    async fn list_deleted(&self) -> DbResult<Vec<Task>> {
        let rows = sqlx::query(&format!("{} WHERE is_deleted = 1", SELECT_TASKS))
            .fetch_all(self.pool)
            .await
            .map_err(db_err)?;

        Ok(rows.iter().map(row_to_task).collect())
    }

    async fn list_with_reminders(&self) -> DbResult<Vec<Task>> {
        let rows = sqlx::query(&format!(
            "{} WHERE reminder IS NOT NULL AND completed = 0 AND is_deleted = 0 ORDER BY reminder ASC",
            SELECT_TASKS
        ))
        .fetch_all(self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows.iter().map(row_to_task).collect())
    }

    async fn count_by_list(&self, list_id: &str) -> DbResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE list_id = ? AND is_deleted = 0")
            .bind(list_id)
            .fetch_one(self.pool)
            .await
            .map_err(db_err)
    }

    async fn count_completed_by_list(&self, list_id: &str) -> DbResult<i64> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM tasks WHERE list_id = ? AND completed = 1 AND is_deleted = 0",
        )
        .bind(list_id)
        .fetch_one(self.pool)
        .await
        .map_err(db_err)
    }

    fn watch_all(&self) -> Subscription<Vec<Task>> {
        spawn_live_query(
            self.pool.clone(),
            self.notifier,
            &[Table::Tasks],
            |pool| async move { fetch_active_tasks(&pool).await },
        )
    }

    fn watch_by_list(&self, list_id: &str) -> Subscription<Vec<Task>> {
        let list_id = list_id.to_string();
        spawn_live_query(
            self.pool.clone(),
            self.notifier,
            &[Table::Tasks],
            move |pool| {
                let list_id = list_id.clone();
                async move { fetch_tasks_by_list(&pool, &list_id).await }
            },
        )
    }
}

/// Insert or fully overwrite a task row.
pub(crate) async fn upsert_task<'e, E>(
    executor: E,
    task: &Task,
    state: SyncState,
) -> sqlx::Result<SqliteQueryResult>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO tasks (id, list_id, title, description, completed, reminder, position, created_at, updated_at, is_synced, is_deleted)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            list_id = excluded.list_id,
            title = excluded.title,
            description = excluded.description,
            completed = excluded.completed,
            reminder = excluded.reminder,
            position = excluded.position,
            created_at = excluded.created_at,
            updated_at = excluded.updated_at,
            is_synced = excluded.is_synced,
            is_deleted = excluded.is_deleted
        "#,
    )
    .bind(&task.id)
    .bind(&task.list_id)
    .bind(&task.title)
    .bind(&task.description)
    .bind(task.completed)
    .bind(&task.reminder)
    .bind(task.position)
    .bind(&task.created_at)
    .bind(&task.updated_at)
    .bind(state.is_synced())
    .bind(state.is_deleted())
    .execute(executor)
    .await
}

/// Mark pushed tasks synced when the row still matches what was pushed.
/// `position` is compared too since `reposition` leaves `updated_at` alone.
pub(crate) async fn mark_tasks_synced(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    tasks: &[Task],
) -> sqlx::Result<u64> {
    let mut counts = Vec::with_capacity(tasks.len());
    for task in tasks {
        let result = sqlx::query(
            r#"
            UPDATE tasks SET is_synced = 1
            WHERE id = ? AND is_deleted = 0
              AND list_id = ? AND title = ? AND description IS ? AND completed = ?
              AND reminder IS ? AND position = ? AND created_at = ? AND updated_at = ?
            "#,
        )
        .bind(&task.id)
        .bind(&task.list_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.completed)
        .bind(&task.reminder)
        .bind(task.position)
        .bind(&task.created_at)
        .bind(&task.updated_at)
        .execute(&mut **tx)
        .await?;
        counts.push(result.rows_affected());
    }
    Ok(total_rows(counts))
}

/// Mark pushed task deletions synced, skipping rows no longer soft-deleted.
pub(crate) async fn mark_deleted_tasks_synced(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    ids: &[Id],
) -> sqlx::Result<u64> {
    let mut counts = Vec::with_capacity(ids.len());
    for id in ids {
        let result = sqlx::query("UPDATE tasks SET is_synced = 1 WHERE id = ? AND is_deleted = 1")
            .bind(id)
            .execute(&mut **tx)
            .await?;
        counts.push(result.rows_affected());
    }
    Ok(total_rows(counts))
}

/// Live tasks with unpropagated edits.
pub(crate) async fn fetch_unsynced_tasks<'e, E>(executor: E) -> sqlx::Result<Vec<Task>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query(&format!(
        "{} WHERE is_synced = 0 AND is_deleted = 0",
        SELECT_TASKS
    ))
    .fetch_all(executor)
    .await?;

    Ok(rows.iter().map(row_to_task).collect())
}

/// All live tasks in display order.
pub(crate) async fn fetch_active_tasks(pool: &SqlitePool) -> DbResult<Vec<Task>> {
    let rows = sqlx::query(&format!("{} WHERE is_deleted = 0 {}", SELECT_TASKS, DISPLAY_ORDER))
        .fetch_all(pool)
        .await
        .map_err(db_err)?;

    Ok(rows.iter().map(row_to_task).collect())
}

/// Live tasks of one list in display order.
pub(crate) async fn fetch_tasks_by_list(pool: &SqlitePool, list_id: &str) -> DbResult<Vec<Task>> {
    let rows = sqlx::query(&format!(
        "{} WHERE list_id = ? AND is_deleted = 0 {}",
        SELECT_TASKS, DISPLAY_ORDER
    ))
    .bind(list_id)
    .fetch_all(pool)
    .await
    .map_err(db_err)?;

    Ok(rows.iter().map(row_to_task).collect())
}

/// Convert a database row to a Task model.
fn row_to_task(row: &SqliteRow) -> Task {
    Task {
        id: row.get("id"),
        list_id: row.get("list_id"),
        title: row.get("title"),
        description: row.get("description"),
        completed: row.get("completed"),
        reminder: row.get("reminder"),
        position: row.get("position"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        sync_state: SyncState::from_flags(row.get("is_synced"), row.get("is_deleted")),
    }
}
