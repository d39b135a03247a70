use crate::error::AppError;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;
use std::str::FromStr;

const NAME: &str = "name";
const PRIORITY: &str = "priority";
const DEADLINE: &str = "deadline";
const CREATED_AT: &str = "created_at";
const COMPLETED_AT: &str = "completed_at";
const STATUS: &str = "status";

pub const COMPLETED_STATUS: &str = "completed";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            _ => Err(AppError::invalid_input(
                "priority must be one of high, medium, low",
            )),
        }
    }
}

/// Trims a task name, rejecting names that are empty afterwards.
pub fn task_name(raw: &str) -> Result<&str, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("task name is required"));
    }
    Ok(trimmed)
}

fn text<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or_default()
}

/// An open task exactly as stored.
///
/// Entries are kept as read: fields this program does not know about, and
/// values it would not have written itself, survive every save. The
/// accessors return an empty string for a missing or non-text field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Task(Value);

impl Task {
    pub fn new(name: &str, priority: Priority, deadline: &str, created_at: &str) -> Self {
        Self(json!({
            NAME: name,
            PRIORITY: priority,
            DEADLINE: deadline,
            CREATED_AT: created_at,
        }))
    }

    pub fn name(&self) -> &str {
        text(&self.0, NAME)
    }

    /// Stored priority text; not necessarily one of [`Priority::ALL`].
    pub fn priority(&self) -> &str {
        text(&self.0, PRIORITY)
    }

    pub fn deadline(&self) -> &str {
        text(&self.0, DEADLINE)
    }

    pub fn created_at(&self) -> &str {
        text(&self.0, CREATED_AT)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Adds `completed_at` and `status`, keeping every other field.
    pub fn complete(self, completed_at: &str) -> Result<CompletedTask, AppError> {
        let Value::Object(mut fields) = self.0 else {
            return Err(AppError::invalid_data(
                "task entry is not an object and cannot be completed",
            ));
        };
        fields.insert(COMPLETED_AT.to_string(), Value::from(completed_at));
        fields.insert(STATUS.to_string(), Value::from(COMPLETED_STATUS));
        Ok(CompletedTask(Value::Object(fields)))
    }
}

/// A task moved out of the open list, stored flat with its completion stamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompletedTask(Value);

impl CompletedTask {
    pub fn name(&self) -> &str {
        text(&self.0, NAME)
    }

    pub fn priority(&self) -> &str {
        text(&self.0, PRIORITY)
    }

    pub fn deadline(&self) -> &str {
        text(&self.0, DEADLINE)
    }

    pub fn completed_at(&self) -> &str {
        text(&self.0, COMPLETED_AT)
    }

    pub fn status(&self) -> &str {
        text(&self.0, STATUS)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}
