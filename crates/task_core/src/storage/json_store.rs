use crate::datetime::now_timestamp;
use crate::error::AppError;
use crate::model::Database;
use serde::Serialize;
use serde_json::Value;
use serde_json::ser::PrettyFormatter;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

const STORE_FILE_NAME: &str = "DB_task_manager.json";
const STORE_ENV_VAR: &str = "TASK_MANAGER_STORE_PATH";

/// Result of opening the data file. `recovered` carries the reason the
/// previous contents were discarded, if they were.
#[derive(Debug, Clone)]
pub struct StoreLoad {
    pub database: Database,
    pub recovered: Option<AppError>,
}

#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
    interface: String,
}

/// Resolves the data file: environment first, then the configured path,
/// then the per-user default.
pub fn store_path(configured: Option<&str>) -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(STORE_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if let Some(path) = configured
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path.trim()));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata)
            .join("task_manager")
            .join(STORE_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("task_manager")
            .join(STORE_FILE_NAME))
    }
}

impl JsonStore {
    pub fn new<P: Into<PathBuf>, I: Into<String>>(path: P, interface: I) -> Self {
        Self {
            path: path.into(),
            interface: interface.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Reads the data file, creating it when absent. A file that does not
    /// parse or lacks a required key is replaced by a fresh database, once;
    /// if that write fails the error is returned as is.
    pub fn load(&self) -> Result<StoreLoad, AppError> {
        if !self.path.exists() {
            let database = self.initialize()?;
            return Ok(StoreLoad {
                database,
                recovered: None,
            });
        }

        match self.read() {
            Ok(database) => Ok(StoreLoad {
                database,
                recovered: None,
            }),
            Err(err @ AppError::StorageCorrupt(_)) => {
                warn!(
                    path = %self.path.display(),
                    reason = err.message(),
                    "data file is corrupt, reinitializing"
                );
                let database = self.initialize()?;
                Ok(StoreLoad {
                    database,
                    recovered: Some(err),
                })
            }
            Err(err) => Err(err),
        }
    }

    /// Stamps `database` for this interface, appends one activity entry and
    /// replaces the file. `database` is only updated once the write succeeded.
    pub fn save(&self, database: &mut Database) -> Result<(), AppError> {
        let timestamp = now_timestamp()?;
        let mut stamped = database.clone();
        stamped.record_write(&self.interface, &timestamp);
        self.write(&stamped)?;

        debug!(
            path = %self.path.display(),
            open = stamped.open_tasks.len(),
            completed = stamped.completed_tasks.len(),
            history = stamped.activity_history.len(),
            "saved database"
        );
        *database = stamped;
        Ok(())
    }

    fn initialize(&self) -> Result<Database, AppError> {
        let timestamp = now_timestamp()?;
        let mut database = Database::empty(&self.interface, &timestamp);
        self.save(&mut database)?;
        info!(path = %self.path.display(), "initialized new database");
        Ok(database)
    }

    fn read(&self) -> Result<Database, AppError> {
        let content = std::fs::read_to_string(&self.path).map_err(|err| {
            AppError::storage_unavailable(format!("{}: {}", self.path.display(), err))
        })?;
        parse_database(&content)
    }

    fn write(&self, database: &Database) -> Result<(), AppError> {
        let unavailable = |err: std::io::Error| {
            AppError::storage_unavailable(format!("{}: {}", self.path.display(), err))
        };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(unavailable)?;

        let mut temp_file = NamedTempFile::new_in(&dir).map_err(unavailable)?;
        {
            let formatter = PrettyFormatter::with_indent(b"    ");
            let mut serializer =
                serde_json::Serializer::with_formatter(temp_file.as_file_mut(), formatter);
            database
                .serialize(&mut serializer)
                .map_err(|err| AppError::invalid_data(err.to_string()))?;
        }
        temp_file.write_all(b"\n").map_err(unavailable)?;
        temp_file.as_file().sync_all().map_err(unavailable)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            temp_file
                .as_file()
                .set_permissions(permissions)
                .map_err(unavailable)?;
        }

        temp_file
            .persist(&self.path)
            .map_err(|err| unavailable(err.error))?;

        Ok(())
    }
}

// Entries are held as stored, so a file that passes `validate_structure`
// always converts.
fn parse_database(content: &str) -> Result<Database, AppError> {
    let value: Value = serde_json::from_str(content)
        .map_err(|err| AppError::storage_corrupt(format!("invalid JSON: {err}")))?;
    validate_structure(&value)?;
    serde_json::from_value(value)
        .map_err(|err| AppError::storage_corrupt(format!("invalid database: {err}")))
}

/// Checks the top-level keys, that the three lists are lists and that
/// `metadata` carries its keys. Individual entries are not inspected.
pub fn validate_structure(value: &Value) -> Result<(), AppError> {
    let root = value
        .as_object()
        .ok_or_else(|| AppError::storage_corrupt("top level is not an object"))?;

    for key in Database::REQUIRED_KEYS {
        if !root.contains_key(key) {
            return Err(AppError::storage_corrupt(format!("missing key `{key}`")));
        }
    }

    for key in Database::LIST_KEYS {
        if !root[key].is_array() {
            return Err(AppError::storage_corrupt(format!("`{key}` is not a list")));
        }
    }

    let metadata = root["metadata"]
        .as_object()
        .ok_or_else(|| AppError::storage_corrupt("`metadata` is not an object"))?;
    for key in Database::REQUIRED_METADATA_KEYS {
        if !metadata.contains_key(key) {
            return Err(AppError::storage_corrupt(format!(
                "missing key `metadata.{key}`"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{JsonStore, validate_structure};
    use crate::model::{Database, PROGRAM_LABEL, Priority, Task};
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(file_name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("task-manager-{nanos}-{file_name}"))
    }

    fn demo_task(name: &str) -> Task {
        Task::new(name, Priority::High, "01-01-2030", "2025-12-20T00:00:00.000000")
    }

    fn valid_file() -> serde_json::Value {
        serde_json::json!({
            "metadata": {
                "signature": "TaskManager",
                "language": "Python-GUI",
                "last_modified": "2025-01-30T09:15:00.123456",
                "author": "Hananel Sabag"
            },
            "open_tasks": [
                {
                    "name": "Call mom",
                    "priority": "high",
                    "deadline": "01-02-2025",
                    "created_at": "2025-01-30T09:15:00.123456"
                }
            ],
            "completed_tasks": [],
            "activity_history": [
                {
                    "program": "Task Manager",
                    "language": "Python-GUI",
                    "timestamp": "2025-01-30T09:15:00.123456"
                }
            ]
        })
    }

    #[test]
    fn load_creates_file_when_missing() {
        let path = temp_path("missing.json");
        let store = JsonStore::new(&path, "Rust-CLI");

        let loaded = store.load().unwrap();
        let on_disk = fs::read_to_string(&path).unwrap();
        fs::remove_file(&path).ok();

        assert!(loaded.recovered.is_none());
        assert!(loaded.database.open_tasks.is_empty());
        assert!(loaded.database.completed_tasks.is_empty());
        assert_eq!(loaded.database.activity_history.len(), 1);
        assert_eq!(loaded.database.metadata.language(), "Rust-CLI");

        let reread: Database = serde_json::from_str(&on_disk).unwrap();
        assert_eq!(reread, loaded.database);
    }

    #[test]
    fn load_reads_files_written_by_other_front_ends() {
        let path = temp_path("foreign.json");
        fs::write(&path, valid_file().to_string()).unwrap();

        let loaded = JsonStore::new(&path, "Rust-CLI").load().unwrap();
        fs::remove_file(&path).ok();

        assert!(loaded.recovered.is_none());
        assert_eq!(loaded.database.open_tasks.len(), 1);
        assert_eq!(loaded.database.open_tasks[0].name(), "Call mom");
        assert_eq!(loaded.database.metadata.language(), "Python-GUI");
        assert_eq!(loaded.database.activity_history.len(), 1);
    }

    #[test]
    fn save_and_load_round_trip() {
        let path = temp_path("round-trip.json");
        let store = JsonStore::new(&path, "Rust-CLI");
        let mut database = store.load().unwrap().database;
        database.open_tasks.push(demo_task("first"));
        database
            .completed_tasks
            .push(demo_task("second").complete("2025-12-21T10:00:00.000000").unwrap());
        let before = database.clone();

        store.save(&mut database).unwrap();
        let loaded = store.load().unwrap().database;
        fs::remove_file(&path).ok();

        assert_eq!(loaded.open_tasks, before.open_tasks);
        assert_eq!(loaded.completed_tasks, before.completed_tasks);
        let (newest, earlier) = loaded.activity_history.split_last().unwrap();
        assert_eq!(earlier, before.activity_history.as_slice());
        assert_eq!(newest.program(), PROGRAM_LABEL);
        assert_eq!(loaded.metadata.last_modified(), newest.timestamp());
    }

    #[test]
    fn save_appends_exactly_one_history_entry() {
        let path = temp_path("history.json");
        let store = JsonStore::new(&path, "Rust-Menu");
        let mut database = store.load().unwrap().database;
        let initial = database.activity_history.len();

        for _ in 0..3 {
            store.save(&mut database).unwrap();
        }
        fs::remove_file(&path).ok();

        assert_eq!(database.activity_history.len(), initial + 3);
        assert!(
            database
                .activity_history
                .iter()
                .all(|entry| entry.language() == "Rust-Menu")
        );
    }

    #[test]
    fn load_recovers_from_invalid_json() {
        let path = temp_path("invalid.json");
        fs::write(&path, "{ not json").unwrap();

        let loaded = JsonStore::new(&path, "Rust-CLI").load().unwrap();
        let reread = JsonStore::new(&path, "Rust-CLI").load().unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded.recovered.unwrap().code(), "storage_corrupt");
        assert!(loaded.database.open_tasks.is_empty());
        assert!(reread.recovered.is_none());
        assert_eq!(reread.database, loaded.database);
    }

    #[test]
    fn load_recovers_from_missing_completed_tasks() {
        let path = temp_path("missing-key.json");
        let mut content = valid_file();
        content.as_object_mut().unwrap().remove("completed_tasks");
        fs::write(&path, content.to_string()).unwrap();

        let loaded = JsonStore::new(&path, "Rust-CLI").load().unwrap();
        fs::remove_file(&path).ok();

        let reason = loaded.recovered.unwrap();
        assert_eq!(reason.code(), "storage_corrupt");
        assert!(reason.message().contains("completed_tasks"));
        assert!(loaded.database.open_tasks.is_empty());
        assert!(loaded.database.completed_tasks.is_empty());
        assert_eq!(loaded.database.activity_history.len(), 1);
        assert_eq!(loaded.database.metadata.language(), "Rust-CLI");
        assert_ne!(
            loaded.database.metadata.last_modified(),
            "2025-01-30T09:15:00.123456"
        );
    }

    #[test]
    fn load_keeps_entries_it_does_not_understand() {
        let path = temp_path("foreign-entries.json");
        let mut content = valid_file();
        content["metadata"]["author"] = serde_json::json!(["two", "authors"]);
        content["open_tasks"] = serde_json::json!([
            {
                "name": "Keep me",
                "priority": "low",
                "deadline": "01-01-2030",
                "created_at": "2025-01-30T09:15:00.123456"
            },
            {
                "name": "Odd one",
                "priority": "urgent",
                "deadline": "02-01-2030",
                "note": "no created_at here"
            }
        ]);
        content["activity_history"][0]["host"] = serde_json::json!("laptop");
        fs::write(&path, content.to_string()).unwrap();
        let store = JsonStore::new(&path, "Rust-CLI");

        let loaded = store.load().unwrap();
        let mut database = loaded.database;
        store.save(&mut database).unwrap();
        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        fs::remove_file(&path).ok();

        assert!(loaded.recovered.is_none());
        assert_eq!(database.open_tasks.len(), 2);
        assert_eq!(database.open_tasks[1].priority(), "urgent");
        assert_eq!(written["open_tasks"], content["open_tasks"]);
        assert_eq!(written["completed_tasks"], content["completed_tasks"]);
        assert_eq!(written["metadata"]["author"], content["metadata"]["author"]);
        assert_eq!(
            written["activity_history"][0],
            content["activity_history"][0]
        );
    }

    #[test]
    fn load_recovers_when_a_list_is_not_a_list() {
        let path = temp_path("not-a-list.json");
        let mut content = valid_file();
        content["open_tasks"] = serde_json::json!({ "name": "Call mom" });
        fs::write(&path, content.to_string()).unwrap();

        let loaded = JsonStore::new(&path, "Rust-CLI").load().unwrap();
        fs::remove_file(&path).ok();

        let reason = loaded.recovered.unwrap();
        assert_eq!(reason.code(), "storage_corrupt");
        assert!(reason.message().contains("open_tasks"));
        assert!(loaded.database.open_tasks.is_empty());
    }

    #[test]
    fn validate_structure_requires_metadata_keys() {
        let mut content = valid_file();
        content["metadata"].as_object_mut().unwrap().remove("author");

        let err = validate_structure(&content).unwrap_err();
        assert_eq!(err.code(), "storage_corrupt");
        assert!(err.message().contains("metadata.author"));
    }

    #[test]
    fn validate_structure_accepts_empty_lists() {
        let content = serde_json::json!({
            "metadata": {
                "signature": "TaskManager",
                "language": "CPP-CLI",
                "last_modified": "2025-01-30 09:15:00",
                "author": "Hananel Sabag"
            },
            "open_tasks": [],
            "completed_tasks": [],
            "activity_history": []
        });

        assert!(validate_structure(&content).is_ok());
    }

    #[test]
    fn load_reports_unwritable_location_without_retrying() {
        let blocker = temp_path("blocker");
        fs::write(&blocker, "not a directory").unwrap();
        let path = blocker.join("tasks.json");

        let err = JsonStore::new(&path, "Rust-CLI").load().unwrap_err();
        fs::remove_file(&blocker).ok();

        assert_eq!(err.code(), "storage_unavailable");
    }

    #[test]
    fn load_reports_unreadable_file_without_wiping_it() {
        let dir = temp_path("is-a-directory");
        fs::create_dir_all(&dir).unwrap();

        let err = JsonStore::new(&dir, "Rust-CLI").load().unwrap_err();
        let still_dir = dir.is_dir();
        fs::remove_dir_all(&dir).ok();

        assert_eq!(err.code(), "storage_unavailable");
        assert!(still_dir);
    }

    #[test]
    fn save_leaves_no_temporary_files_behind() {
        let dir = temp_path("atomic");
        let path = dir.join("tasks.json");
        let store = JsonStore::new(&path, "Rust-CLI");
        let mut database = store.load().unwrap().database;
        database.open_tasks.push(demo_task("first"));
        store.save(&mut database).unwrap();

        let entries: Vec<_> = fs::read_dir(&dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        fs::remove_dir_all(&dir).ok();

        assert_eq!(entries, vec![std::ffi::OsString::from("tasks.json")]);
    }

    #[test]
    fn failed_save_leaves_database_untouched() {
        let blocker = temp_path("blocker-save");
        fs::write(&blocker, "not a directory").unwrap();
        let store = JsonStore::new(blocker.join("tasks.json"), "Rust-CLI");
        let mut database = Database::empty("Rust-CLI", "2025-12-20T00:00:00Z");
        let before = database.clone();

        let err = store.save(&mut database).unwrap_err();
        fs::remove_file(&blocker).ok();

        assert_eq!(err.code(), "storage_unavailable");
        assert_eq!(database, before);
    }
}
