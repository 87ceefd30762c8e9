//! Domain models for the to-do store.
//!
//! These models are storage-agnostic. Timestamps are kept as caller-formatted
//! strings; this layer never parses or validates them.

use serde::{Deserialize, Serialize};

/// Identifier type used for all entities.
pub type Id = String;

/// Color assigned to a list when the caller does not pick one.
pub const DEFAULT_LIST_COLOR: &str = "#3B82F6";

// =============================================================================
// Sync bookkeeping
// =============================================================================

/// Local sync state of a list or task row.
///
/// Persisted as the two integer columns `is_synced` and `is_deleted`:
///
/// | state          | is_synced | is_deleted |
/// |----------------|-----------|------------|
/// | `Dirty`        | 0         | 0          |
/// | `Clean`        | 1         | 0          |
/// | `DeletedDirty` | 0         | 1          |
/// | `DeletedClean` | 1         | 1          |
///
/// Only `DeletedClean` rows may be physically purged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    /// Local changes not yet propagated.
    #[default]
    Dirty,
    /// In step with the remote side.
    Clean,
    /// Soft-deleted locally, deletion not yet propagated.
    DeletedDirty,
    /// Soft-deleted and propagated; eligible for purge.
    DeletedClean,
}

impl SyncState {
    /// Build the state from the persisted flag pair.
    pub fn from_flags(is_synced: bool, is_deleted: bool) -> Self {
        match (is_synced, is_deleted) {
            (false, false) => SyncState::Dirty,
            (true, false) => SyncState::Clean,
            (false, true) => SyncState::DeletedDirty,
            (true, true) => SyncState::DeletedClean,
        }
    }

    pub fn is_synced(self) -> bool {
        matches!(self, SyncState::Clean | SyncState::DeletedClean)
    }

    pub fn is_deleted(self) -> bool {
        matches!(self, SyncState::DeletedDirty | SyncState::DeletedClean)
    }

    pub fn is_purgeable(self) -> bool {
        self == SyncState::DeletedClean
    }

    /// State after any local mutation. Liveness is preserved.
    pub fn touched(self) -> Self {
        if self.is_deleted() {
            SyncState::DeletedDirty
        } else {
            SyncState::Dirty
        }
    }

    /// State after a local soft delete.
    pub fn soft_deleted(self) -> Self {
        SyncState::DeletedDirty
    }

    /// State after the remote side confirmed the row.
    pub fn synced(self) -> Self {
        if self.is_deleted() {
            SyncState::DeletedClean
        } else {
            SyncState::Clean
        }
    }
}

impl std::fmt::Display for SyncState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncState::Dirty => write!(f, "dirty"),
            SyncState::Clean => write!(f, "clean"),
            SyncState::DeletedDirty => write!(f, "deleted_dirty"),
            SyncState::DeletedClean => write!(f, "deleted_clean"),
        }
    }
}

impl std::str::FromStr for SyncState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dirty" => Ok(SyncState::Dirty),
            "clean" => Ok(SyncState::Clean),
            "deleted_dirty" => Ok(SyncState::DeletedDirty),
            "deleted_clean" => Ok(SyncState::DeletedClean),
            _ => Err(format!("Unknown sync state: {}", s)),
        }
    }
}

// =============================================================================
// Entities
// =============================================================================

/// The signed-in account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Id,
    pub username: String,
    pub email: String,
    pub created_at: String,
}

/// A named collection of tasks owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoList {
    pub id: Id,
    pub user_id: Id,
    pub name: String,
    pub color: String,
    pub reminder: Option<String>,
    /// Keep a persistent notification for this list on the device.
    pub is_persistent: bool,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub sync_state: SyncState,
}

impl TodoList {
    /// A fresh, dirty list with default color and no reminder.
    pub fn new(
        id: impl Into<Id>,
        user_id: impl Into<Id>,
        name: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        let timestamp = timestamp.into();
        Self {
            id: id.into(),
            user_id: user_id.into(),
            name: name.into(),
            color: DEFAULT_LIST_COLOR.to_string(),
            reminder: None,
            is_persistent: false,
            created_at: timestamp.clone(),
            updated_at: timestamp,
            sync_state: SyncState::Dirty,
        }
    }
}

/// An individual to-do item within a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: Id,
    pub list_id: Id,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub reminder: Option<String>,
    /// Manual ordering key. Not unique.
    #[serde(default)]
    pub position: i32,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub sync_state: SyncState,
}

impl Task {
    /// A fresh, dirty, incomplete task at position 0.
    pub fn new(
        id: impl Into<Id>,
        list_id: impl Into<Id>,
        title: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        let timestamp = timestamp.into();
        Self {
            id: id.into(),
            list_id: list_id.into(),
            title: title.into(),
            description: None,
            completed: false,
            reminder: None,
            position: 0,
            created_at: timestamp.clone(),
            updated_at: timestamp,
            sync_state: SyncState::Dirty,
        }
    }
}

// =============================================================================
// Sync exchange types
// =============================================================================

/// Local changes that still have to be pushed to the remote side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingChanges {
    /// Live lists with unpropagated edits.
    pub lists: Vec<TodoList>,
    /// Live tasks with unpropagated edits.
    pub tasks: Vec<Task>,
    pub deleted_list_ids: Vec<Id>,
    pub deleted_task_ids: Vec<Id>,
}

impl PendingChanges {
    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
            && self.tasks.is_empty()
            && self.deleted_list_ids.is_empty()
            && self.deleted_task_ids.is_empty()
    }
}

/// Rows received from the remote side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteChanges {
    #[serde(default)]
    pub lists: Vec<TodoList>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub deleted_list_ids: Vec<Id>,
    #[serde(default)]
    pub deleted_task_ids: Vec<Id>,
}

/// Outcome of acknowledging a push.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub marked_synced: u64,
    pub purged_lists: u64,
    pub purged_tasks: u64,
}

/// Outcome of applying remote rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ApplySummary {
    pub lists_upserted: u64,
    pub tasks_upserted: u64,
    pub lists_deleted: u64,
    pub tasks_deleted: u64,
}
