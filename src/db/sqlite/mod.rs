//! SQLite implementation of the database traits.
//!
//! This module provides a SQLite-backed implementation of the repository
//! traits defined in the parent module.

mod connection;
mod helpers;
mod live;
mod schema;
mod sync;
mod task;
mod todo_list;
mod user;

#[cfg(test)]
mod sync_test;
#[cfg(test)]
mod task_test;

pub use connection::SqliteDatabase;
pub use sync::SqliteSyncRepository;
pub use task::SqliteTaskRepository;
pub use todo_list::SqliteTodoListRepository;
pub use user::SqliteUserRepository;
