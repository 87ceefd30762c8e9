pub mod list;
pub mod schema;
pub mod sync;
pub mod task;
pub mod watch;


#[cfg(test)]
#[path = "task_test.rs"]
mod task_test;
