//! Change notification system for broadcasting table writes to live queries.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Tables that publish change notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Users,
    TodoLists,
    Tasks,
}

impl Table {
    /// SQL table name.
    pub fn as_str(self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::TodoLists => "todo_lists",
            Table::Tasks => "tasks",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What kind of write touched the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// Message broadcast after a committed write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableChange {
    pub table: Table,
    pub kind: ChangeKind,
}

impl TableChange {
    pub fn new(table: Table, kind: ChangeKind) -> Self {
        Self { table, kind }
    }
}

/// Pub/sub notifier keyed by table name.
#[derive(Clone)]
pub struct ChangeNotifier {
    tx: broadcast::Sender<TableChange>,
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeNotifier {
    /// Create a new ChangeNotifier with a buffer of 100 messages.
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(100);
        Self { tx }
    }

    /// Subscribe to receive change notifications for every table.
    pub fn subscribe(&self) -> broadcast::Receiver<TableChange> {
        self.tx.subscribe()
    }

    /// Broadcast a change to all subscribers.
    pub fn notify(&self, change: TableChange) {
        let _ = self.tx.send(change);
    }

    /// Shorthand for `notify(TableChange::new(table, kind))`.
    pub fn touch(&self, table: Table, kind: ChangeKind) {
        self.notify(TableChange::new(table, kind));
    }

    /// Number of live receivers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
