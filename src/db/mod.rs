//! Database abstraction layer.
//!
//! This module provides trait-based abstractions for data access,
//! allowing different storage backends to be swapped without changing
//! business logic.
//!
//! # Architecture
//!
//! - `error`: Storage-agnostic error types
//! - `models`: Domain entities (User, TodoList, Task) and the per-row `SyncState`
//! - `notifier`: Table-keyed change broadcast
//! - `subscription`: Cancellable live-query results
//! - `repository`: Trait definitions for data access
//! - `sqlite`: SQLx/SQLite implementation

mod error;
mod models;
mod notifier;
mod repository;
pub mod sqlite;
mod subscription;
pub mod utils;


pub use error::{DbError, DbResult};
pub use models::*;
pub use notifier::{ChangeKind, ChangeNotifier, Table, TableChange};
pub use repository::*;
pub use sqlite::SqliteDatabase;
pub use subscription::Subscription;
