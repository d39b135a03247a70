use crate::model::{CompletedTask, Task};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

pub const SIGNATURE: &str = "TaskManager";
pub const PROGRAM_LABEL: &str = "Task Manager";
pub const AUTHOR: &str = "Hananel Sabag";

const LANGUAGE: &str = "language";
const LAST_MODIFIED: &str = "last_modified";

fn text<'a>(value: Option<&'a Value>) -> &'a str {
    value.and_then(Value::as_str).unwrap_or_default()
}

/// File header. `language` names the front-end that last wrote the file.
/// Only `language` and `last_modified` are ever rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(Map<String, Value>);

impl Metadata {
    pub fn signature(&self) -> &str {
        text(self.0.get("signature"))
    }

    pub fn language(&self) -> &str {
        text(self.0.get(LANGUAGE))
    }

    pub fn last_modified(&self) -> &str {
        text(self.0.get(LAST_MODIFIED))
    }

    pub fn author(&self) -> &str {
        text(self.0.get("author"))
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityEntry(Value);

impl ActivityEntry {
    pub fn new(program: &str, language: &str, timestamp: &str) -> Self {
        Self(json!({
            "program": program,
            LANGUAGE: language,
            "timestamp": timestamp,
        }))
    }

    pub fn program(&self) -> &str {
        text(self.0.get("program"))
    }

    pub fn language(&self) -> &str {
        text(self.0.get(LANGUAGE))
    }

    pub fn timestamp(&self) -> &str {
        text(self.0.get("timestamp"))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

/// The whole data file. Top-level keys other than the four known lists are
/// carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Database {
    pub metadata: Metadata,
    pub open_tasks: Vec<Task>,
    pub completed_tasks: Vec<CompletedTask>,
    pub activity_history: Vec<ActivityEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Database {
    pub const REQUIRED_KEYS: [&'static str; 4] = [
        "metadata",
        "open_tasks",
        "completed_tasks",
        "activity_history",
    ];
    pub const LIST_KEYS: [&'static str; 3] = ["open_tasks", "completed_tasks", "activity_history"];
    pub const REQUIRED_METADATA_KEYS: [&'static str; 4] =
        ["signature", LANGUAGE, LAST_MODIFIED, "author"];

    pub fn empty(interface: &str, timestamp: &str) -> Self {
        let mut metadata = Map::new();
        metadata.insert("signature".to_string(), Value::from(SIGNATURE));
        metadata.insert(LANGUAGE.to_string(), Value::from(interface));
        metadata.insert(LAST_MODIFIED.to_string(), Value::from(timestamp));
        metadata.insert("author".to_string(), Value::from(AUTHOR));

        Self {
            metadata: Metadata(metadata),
            open_tasks: Vec::new(),
            completed_tasks: Vec::new(),
            activity_history: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Stamps the header and appends the matching activity entry.
    pub fn record_write(&mut self, interface: &str, timestamp: &str) {
        self.metadata
            .0
            .insert(LAST_MODIFIED.to_string(), Value::from(timestamp));
        self.metadata
            .0
            .insert(LANGUAGE.to_string(), Value::from(interface));
        self.activity_history
            .push(ActivityEntry::new(PROGRAM_LABEL, interface, timestamp));
    }
}
