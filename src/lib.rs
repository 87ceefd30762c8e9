//! Local persistence for a to-do app: users, lists and tasks in SQLite with
//! soft deletes, sync bookkeeping and live queries.

pub mod config;
pub mod db;

#[cfg(feature = "cli")]
pub mod cli;
