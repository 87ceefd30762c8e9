//! Repository traits for data access abstraction.
//!
//! These traits define the contract for data access, allowing different
//! storage backends to be swapped without changing business logic.
//!
//! Conventions shared by every repository:
//! - point reads return `Ok(None)` when no live row matches;
//! - targeted writes return the number of affected rows, `Ok(0)` is not an error;
//! - soft-deleted rows are invisible to every read except `list_deleted`.

use std::future::Future;

use crate::db::{
    ChangeNotifier, DbResult, Subscription,
    models::{ApplySummary, PendingChanges, RemoteChanges, SyncSummary, Task, TodoList, User},
};

/// Repository for the account record.
pub trait UserRepository {
    /// Insert a user, replacing any row with the same id.
    fn insert(&self, user: &User) -> impl Future<Output = DbResult<()>> + Send;

    /// Get a user by ID.
    fn get(&self, id: &str) -> impl Future<Output = DbResult<Option<User>>> + Send;

    /// Get the signed-in user (the first stored row).
    fn current(&self) -> impl Future<Output = DbResult<Option<User>>> + Send;

    /// Remove every user row.
    fn delete_all(&self) -> impl Future<Output = DbResult<u64>> + Send;
}

/// Repository for TodoList operations.
pub trait TodoListRepository {
    /// Insert a list, fully replacing the columns of any row with the same id.
    fn insert(&self, list: &TodoList) -> impl Future<Output = DbResult<()>> + Send;

    /// Insert many lists in one transaction.
    fn insert_all(&self, lists: &[TodoList]) -> impl Future<Output = DbResult<()>> + Send;

    /// Overwrite a list's content and mark it unsynced.
    fn update(&self, list: &TodoList) -> impl Future<Output = DbResult<u64>> + Send;

    /// Soft delete: hide the list and mark the deletion unsynced.
    fn mark_deleted(&self, id: &str) -> impl Future<Output = DbResult<u64>> + Send;

    /// Physically delete a list; its tasks go with it.
    fn delete(&self, id: &str) -> impl Future<Output = DbResult<u64>> + Send;

    /// Physically delete lists whose deletion has been synced.
    fn purge_synced_deletions(&self) -> impl Future<Output = DbResult<u64>> + Send;

    /// Record that the remote side has the latest version of this list.
    fn mark_synced(&self, id: &str) -> impl Future<Output = DbResult<u64>> + Send;

    /// Physically delete every list (and therefore every task).
    fn delete_all(&self) -> impl Future<Output = DbResult<u64>> + Send;

    /// All live lists, newest first.
    fn list(&self) -> impl Future<Output = DbResult<Vec<TodoList>>> + Send;

    /// Get a live list by ID.
    fn get(&self, id: &str) -> impl Future<Output = DbResult<Option<TodoList>>> + Send;

    /// Live lists with unpropagated edits.
    fn list_unsynced(&self) -> impl Future<Output = DbResult<Vec<TodoList>>> + Send;

    /// All soft-deleted lists, synced or not.
    fn list_deleted(&self) -> impl Future<Output = DbResult<Vec<TodoList>>> + Send;

    /// Live lists that carry a reminder.
    fn list_with_reminders(&self) -> impl Future<Output = DbResult<Vec<TodoList>>> + Send;

    /// Subscribe to `list()`, re-delivered after every write to `todo_lists`.
    fn watch_all(&self) -> Subscription<Vec<TodoList>>;
}

/// Repository for Task operations.
pub trait TaskRepository {
    /// Insert a task, fully replacing the columns of any row with the same id.
    fn insert(&self, task: &Task) -> impl Future<Output = DbResult<()>> + Send;

    /// Insert many tasks in one transaction.
    fn insert_all(&self, tasks: &[Task]) -> impl Future<Output = DbResult<()>> + Send;

    /// Overwrite a task's content and mark it unsynced.
    fn update(&self, task: &Task) -> impl Future<Output = DbResult<u64>> + Send;

    /// Set the completed flag and `updated_at`, mark unsynced.
    fn set_completed(
        &self,
        id: &str,
        completed: bool,
        updated_at: &str,
    ) -> impl Future<Output = DbResult<u64>> + Send;

    /// Move a task. Marks it unsynced but leaves `updated_at` alone.
    fn reposition(&self, id: &str, position: i32) -> impl Future<Output = DbResult<u64>> + Send;

    /// Assign positions `0..n` following the order of `ids`, in one transaction.
    fn reorder(&self, ids: &[String]) -> impl Future<Output = DbResult<u64>> + Send;

    /// Soft delete: hide the task and mark the deletion unsynced.
    fn mark_deleted(&self, id: &str) -> impl Future<Output = DbResult<u64>> + Send;

    /// Physically delete a task.
    fn delete(&self, id: &str) -> impl Future<Output = DbResult<u64>> + Send;

    /// Physically delete every task of a list, soft-deleted ones included.
    fn delete_by_list(&self, list_id: &str) -> impl Future<Output = DbResult<u64>> + Send;

    /// Physically delete tasks whose deletion has been synced.
    fn purge_synced_deletions(&self) -> impl Future<Output = DbResult<u64>> + Send;

    /// Record that the remote side has the latest version of this task.
    fn mark_synced(&self, id: &str) -> impl Future<Output = DbResult<u64>> + Send;

    /// Physically delete every task.
    fn delete_all(&self) -> impl Future<Output = DbResult<u64>> + Send;

    /// All live tasks across lists, in display order.
    fn list_all(&self) -> impl Future<Output = DbResult<Vec<Task>>> + Send;

    /// Live tasks of one list: incomplete first, then position, then newest.
    fn list_by_list(&self, list_id: &str) -> impl Future<Output = DbResult<Vec<Task>>> + Send;

    /// Get a live task by ID.
    fn get(&self, id: &str) -> impl Future<Output = DbResult<Option<Task>>> + Send;

    /// Live tasks with unpropagated edits.
    fn list_unsynced(&self) -> impl Future<Output = DbResult<Vec<Task>>> + Send;

    /// All soft-deleted tasks, synced or not.
    fn list_deleted(&self) -> impl Future<Output = DbResult<Vec<Task>>> + Send;

    /// Live, incomplete tasks that carry a reminder.
    fn list_with_reminders(&self) -> impl Future<Output = DbResult<Vec<Task>>> + Send;

    /// Number of live tasks in a list.
    fn count_by_list(&self, list_id: &str) -> impl Future<Output = DbResult<i64>> + Send;

    /// Number of live, completed tasks in a list.
    fn count_completed_by_list(&self, list_id: &str)
    -> impl Future<Output = DbResult<i64>> + Send;

    /// Subscribe to `list_all()`.
    fn watch_all(&self) -> Subscription<Vec<Task>>;

    /// Subscribe to `list_by_list(list_id)`.
    fn watch_by_list(&self, list_id: &str) -> Subscription<Vec<Task>>;
}

/// Bookkeeping used by the remote sync agent.
pub trait SyncRepository {
    /// Snapshot of everything the remote side has not seen yet.
    fn pending_changes(&self) -> impl Future<Output = DbResult<PendingChanges>> + Send;

    /// Mark a pushed snapshot as synced and purge confirmed deletions.
    fn acknowledge(
        &self,
        pushed: &PendingChanges,
    ) -> impl Future<Output = DbResult<SyncSummary>> + Send;

    /// Store rows pulled from the remote side as synced; apply remote deletions.
    fn apply_remote(
        &self,
        changes: &RemoteChanges,
    ) -> impl Future<Output = DbResult<ApplySummary>> + Send;

    /// Remove every task, list and user (sign-out).
    fn clear_all(&self) -> impl Future<Output = DbResult<()>> + Send;
}

/// Combined database interface.
pub trait Database: Send + Sync {
    type Users<'a>: UserRepository + Send + Sync
    where
        Self: 'a;
    type TodoLists<'a>: TodoListRepository + Send + Sync
    where
        Self: 'a;
    type Tasks<'a>: TaskRepository + Send + Sync
    where
        Self: 'a;
    type SyncRepo<'a>: SyncRepository + Send + Sync
    where
        Self: 'a;

    /// Apply pending migrations, then run the schema integrity check.
    fn migrate(&self) -> impl Future<Output = DbResult<()>> + Send;

    /// Compare the live schema with the declared one.
    fn validate_schema(&self) -> impl Future<Output = DbResult<()>> + Send;

    /// Change notifier shared by all repositories of this database.
    fn notifier(&self) -> &ChangeNotifier;

    /// Get the user repository.
    fn users(&self) -> Self::Users<'_>;

    /// Get the todo list repository.
    fn todo_lists(&self) -> Self::TodoLists<'_>;

    /// Get the task repository.
    fn tasks(&self) -> Self::Tasks<'_>;

    /// Get the sync repository.
    fn sync(&self) -> Self::SyncRepo<'_>;
}
