mod database;
mod task;

pub use database::{ActivityEntry, AUTHOR, Database, Metadata, PROGRAM_LABEL, SIGNATURE};
pub use task::{COMPLETED_STATUS, CompletedTask, Priority, Task, task_name};
