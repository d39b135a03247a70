use crate::datetime::{now_timestamp, parse_deadline};
use crate::error::AppError;
use crate::model::{ActivityEntry, CompletedTask, Database, Priority, Task, task_name};
use crate::storage::JsonStore;

/// In-memory view of the data file plus the mutations front-ends call.
///
/// Every mutation validates first, applies to a copy, persists the copy
/// and only then replaces the in-memory state, so a failed call leaves
/// both the file and this value unchanged.
#[derive(Debug)]
pub struct TaskRepository {
    store: JsonStore,
    database: Database,
    recovered: Option<AppError>,
}

impl TaskRepository {
    pub fn open(store: JsonStore) -> Result<Self, AppError> {
        let loaded = store.load()?;
        Ok(Self {
            store,
            database: loaded.database,
            recovered: loaded.recovered,
        })
    }

    /// Why the previous data file was discarded on open, if it was.
    pub fn recovered(&self) -> Option<&AppError> {
        self.recovered.as_ref()
    }

    pub fn store(&self) -> &JsonStore {
        &self.store
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn add_task(
        &mut self,
        name: &str,
        priority: Priority,
        deadline: &str,
    ) -> Result<Task, AppError> {
        let name = task_name(name)?;
        let deadline = parse_deadline(deadline)?;

        let task = Task::new(name, priority, &deadline, &now_timestamp()?);

        let mut next = self.database.clone();
        next.open_tasks.push(task.clone());
        self.commit(next)?;

        Ok(task)
    }

    pub fn list_open(&self) -> &[Task] {
        &self.database.open_tasks
    }

    pub fn complete_task(&mut self, index: usize) -> Result<CompletedTask, AppError> {
        let position = self.open_position(index)?;
        let completed_at = now_timestamp()?;

        let mut next = self.database.clone();
        let completed = next.open_tasks.remove(position).complete(&completed_at)?;
        next.completed_tasks.push(completed.clone());
        self.commit(next)?;

        Ok(completed)
    }

    pub fn delete_task(&mut self, index: usize) -> Result<Task, AppError> {
        let position = self.open_position(index)?;

        let mut next = self.database.clone();
        let removed = next.open_tasks.remove(position);
        self.commit(next)?;

        Ok(removed)
    }

    /// Completed tasks in the order they were completed.
    pub fn list_completed(&self) -> &[CompletedTask] {
        &self.database.completed_tasks
    }

    /// Activity entries in the order they were written.
    pub fn list_activity(&self) -> &[ActivityEntry] {
        &self.database.activity_history
    }

    /// Maps a 1-based display number onto `open_tasks`.
    fn open_position(&self, index: usize) -> Result<usize, AppError> {
        let len = self.database.open_tasks.len();
        if index == 0 || index > len {
            return Err(if len == 0 {
                AppError::out_of_range(format!("task {index} does not exist: no open tasks"))
            } else {
                AppError::out_of_range(format!(
                    "task {index} does not exist: choose 1 to {len}"
                ))
            });
        }
        Ok(index - 1)
    }

    fn commit(&mut self, mut next: Database) -> Result<(), AppError> {
        self.store.save(&mut next)?;
        self.database = next;
        Ok(())
    }
}
