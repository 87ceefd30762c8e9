//! SQLite SyncRepository implementation.
//!
//! Every operation here runs in a single transaction. Statements go through
//! `&mut *tx` so the transaction's own connection is reused; acquiring a
//! second pooled connection would stall a single-connection pool.

use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, instrument};

use super::helpers::{db_err, total_rows};
use super::task::{
    fetch_unsynced_tasks, mark_deleted_tasks_synced, mark_tasks_synced, upsert_task,
};
use super::todo_list::{
    fetch_unsynced_lists, mark_deleted_lists_synced, mark_lists_synced, upsert_list,
};
use crate::db::{
    ApplySummary, ChangeKind, ChangeNotifier, DbError, DbResult, Id, PendingChanges,
    RemoteChanges, SyncRepository, SyncState, SyncSummary, Table, Task, TodoList,
};

/// SQLx-backed sync bookkeeping.
pub struct SqliteSyncRepository<'a> {
    pub(crate) pool: &'a SqlitePool,
    pub(crate) notifier: &'a ChangeNotifier,
}

impl<'a> SqliteSyncRepository<'a> {
    async fn begin(&self) -> DbResult<Transaction<'static, Sqlite>> {
        self.pool.begin().await.map_err(|e| DbError::Database {
            message: format!("Failed to begin transaction: {}", e),
        })
    }
}

impl<'a> SyncRepository for SqliteSyncRepository<'a> {
    async fn pending_changes(&self) -> DbResult<PendingChanges> {
        // One transaction so the four reads see the same snapshot.
        let mut tx = self.begin().await?;

        let lists: Vec<TodoList> = fetch_unsynced_lists(&mut *tx)
            .await
            .map_err(db_err)?;
        let tasks: Vec<Task> = fetch_unsynced_tasks(&mut *tx)
            .await
            .map_err(db_err)?;
        let deleted_list_ids: Vec<Id> =
            sqlx::query_scalar("SELECT id FROM todo_lists WHERE is_deleted = 1")
                .fetch_all(&mut *tx)
                .await
                .map_err(db_err)?;
        let deleted_task_ids: Vec<Id> =
            sqlx::query_scalar("SELECT id FROM tasks WHERE is_deleted = 1")
                .fetch_all(&mut *tx)
                .await
                .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;

        debug!(
            lists = lists.len(),
            tasks = tasks.len(),
            deleted_lists = deleted_list_ids.len(),
            deleted_tasks = deleted_task_ids.len(),
            "collected pending changes"
        );

        Ok(PendingChanges {
            lists,
            tasks,
            deleted_list_ids,
            deleted_task_ids,
        })
    }

    #[instrument(skip(self, pushed))]
    async fn acknowledge(&self, pushed: &PendingChanges) -> DbResult<SyncSummary> {
        if pushed.is_empty() {
            return Ok(SyncSummary::default());
        }

        let mut tx = self.begin().await?;

        // Rows changed since the snapshot keep their dirty flag.
        let lists_marked = mark_lists_synced(&mut tx, &pushed.lists)
            .await
            .map_err(db_err)?;
        let list_deletions_marked = mark_deleted_lists_synced(&mut tx, &pushed.deleted_list_ids)
            .await
            .map_err(db_err)?;
        let tasks_marked = mark_tasks_synced(&mut tx, &pushed.tasks)
            .await
            .map_err(db_err)?;
        let task_deletions_marked = mark_deleted_tasks_synced(&mut tx, &pushed.deleted_task_ids)
            .await
            .map_err(db_err)?;
        let lists_marked = lists_marked + list_deletions_marked;
        let tasks_marked = tasks_marked + task_deletions_marked;

        // Tasks first, so cascaded rows are not counted as purged tasks.
        let purged_tasks = sqlx::query("DELETE FROM tasks WHERE is_deleted = 1 AND is_synced = 1")
            .execute(&mut *tx)
            .await
            .map_err(db_err)?
            .rows_affected();
        let purged_lists =
            sqlx::query("DELETE FROM todo_lists WHERE is_deleted = 1 AND is_synced = 1")
                .execute(&mut *tx)
                .await
                .map_err(db_err)?
                .rows_affected();

        tx.commit().await.map_err(db_err)?;

        let summary = SyncSummary {
            marked_synced: total_rows([lists_marked, tasks_marked]),
            purged_lists,
            purged_tasks,
        };
        debug!(?summary, "acknowledged push");

        if lists_marked > 0 || purged_lists > 0 {
            self.notifier.touch(Table::TodoLists, ChangeKind::Update);
        }
        if tasks_marked > 0 || purged_tasks > 0 || purged_lists > 0 {
            self.notifier.touch(Table::Tasks, ChangeKind::Update);
        }
        Ok(summary)
    }

    #[instrument(skip(self, changes))]
    async fn apply_remote(&self, changes: &RemoteChanges) -> DbResult<ApplySummary> {
        let mut tx = self.begin().await?;
        let mut summary = ApplySummary::default();

        // Lists before tasks so remote tasks find their parent.
        for list in &changes.lists {
            summary.lists_upserted += upsert_list(&mut *tx, list, SyncState::Clean)
                .await
                .map_err(db_err)?
                .rows_affected();
        }
        for task in &changes.tasks {
            summary.tasks_upserted += upsert_task(&mut *tx, task, SyncState::Clean)
                .await
                .map_err(db_err)?
                .rows_affected();
        }

        for id in &changes.deleted_task_ids {
            summary.tasks_deleted += sqlx::query("DELETE FROM tasks WHERE id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(db_err)?
                .rows_affected();
        }
        for id in &changes.deleted_list_ids {
            summary.lists_deleted += sqlx::query("DELETE FROM todo_lists WHERE id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(db_err)?
                .rows_affected();
        }

        tx.commit().await.map_err(db_err)?;
        debug!(?summary, "applied remote changes");

        if summary.lists_upserted > 0 || summary.lists_deleted > 0 {
            self.notifier.touch(Table::TodoLists, ChangeKind::Update);
        }
        if summary.tasks_upserted > 0 || summary.tasks_deleted > 0 || summary.lists_deleted > 0 {
            self.notifier.touch(Table::Tasks, ChangeKind::Update);
        }
        Ok(summary)
    }

    #[instrument(skip(self))]
    async fn clear_all(&self) -> DbResult<()> {
        let mut tx = self.begin().await?;

        for sql in [
            "DELETE FROM tasks",
            "DELETE FROM todo_lists",
            "DELETE FROM users",
        ] {
            sqlx::query(sql)
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
        }

        tx.commit().await.map_err(db_err)?;
        debug!("cleared all local data");

        for table in [Table::Tasks, Table::TodoLists, Table::Users] {
            self.notifier.touch(table, ChangeKind::Delete);
        }
        Ok(())
    }
}
