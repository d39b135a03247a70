use serde_json::{Map, Value, json};
use tabled::settings::Style;
use tabled::{Table, Tabled};
use task_core::datetime::{display_minutes, display_seconds};
use task_core::model::{ActivityEntry, CompletedTask, Task};

#[derive(Tabled)]
struct OpenRow<'a> {
    #[tabled(rename = "#")]
    number: usize,
    #[tabled(rename = "Task")]
    name: &'a str,
    #[tabled(rename = "Priority")]
    priority: &'a str,
    #[tabled(rename = "Deadline")]
    deadline: &'a str,
}

#[derive(Tabled)]
struct CompletedRow<'a> {
    #[tabled(rename = "#")]
    number: usize,
    #[tabled(rename = "Task")]
    name: &'a str,
    #[tabled(rename = "Priority")]
    priority: &'a str,
    #[tabled(rename = "Completed")]
    completed: String,
}

#[derive(Tabled)]
struct ActivityRow<'a> {
    #[tabled(rename = "#")]
    number: usize,
    #[tabled(rename = "When")]
    when: String,
    #[tabled(rename = "Program")]
    program: &'a str,
    #[tabled(rename = "Interface")]
    interface: &'a str,
}

/// Display order over an insertion-ordered slice; storage is never reordered.
fn ordered<T>(items: &[T], newest_first: bool) -> Vec<&T> {
    if newest_first {
        items.iter().rev().collect()
    } else {
        items.iter().collect()
    }
}

pub fn open_lines(tasks: &[Task]) -> Vec<String> {
    tasks
        .iter()
        .enumerate()
        .map(|(i, task)| {
            format!(
                "{}. {} - Priority: {} - Deadline: {}",
                i + 1,
                task.name(),
                task.priority(),
                task.deadline()
            )
        })
        .collect()
}

pub fn completed_lines(tasks: &[CompletedTask], newest_first: bool) -> Vec<String> {
    ordered(tasks, newest_first)
        .into_iter()
        .enumerate()
        .map(|(i, done)| {
            format!(
                "{}. {} - Priority: {} - Completed: {}",
                i + 1,
                done.name(),
                done.priority(),
                display_minutes(done.completed_at())
            )
        })
        .collect()
}

pub fn activity_lines(entries: &[ActivityEntry], newest_first: bool) -> Vec<String> {
    ordered(entries, newest_first)
        .into_iter()
        .enumerate()
        .map(|(i, entry)| {
            format!(
                "{}. {} - {} ({})",
                i + 1,
                display_seconds(entry.timestamp()),
                entry.program(),
                entry.language()
            )
        })
        .collect()
}

pub fn open_table(tasks: &[Task]) -> String {
    let rows = tasks.iter().enumerate().map(|(i, task)| OpenRow {
        number: i + 1,
        name: task.name(),
        priority: task.priority(),
        deadline: task.deadline(),
    });
    Table::new(rows).with(Style::psql()).to_string()
}

pub fn completed_table(tasks: &[CompletedTask], newest_first: bool) -> String {
    let rows = ordered(tasks, newest_first)
        .into_iter()
        .enumerate()
        .map(|(i, done)| CompletedRow {
            number: i + 1,
            name: done.name(),
            priority: done.priority(),
            completed: display_minutes(done.completed_at()),
        });
    Table::new(rows).with(Style::psql()).to_string()
}

pub fn activity_table(entries: &[ActivityEntry], newest_first: bool) -> String {
    let rows = ordered(entries, newest_first)
        .into_iter()
        .enumerate()
        .map(|(i, entry)| ActivityRow {
            number: i + 1,
            when: display_seconds(entry.timestamp()),
            program: entry.program(),
            interface: entry.language(),
        });
    Table::new(rows).with(Style::psql()).to_string()
}

/// Open tasks as stored, each led by the 1-based number `done` and
/// `delete` accept.
pub fn open_json(tasks: &[Task]) -> Value {
    Value::Array(
        tasks
            .iter()
            .enumerate()
            .map(|(i, task)| {
                let mut row = Map::new();
                row.insert("index".to_string(), json!(i + 1));
                if let Some(fields) = task.as_value().as_object() {
                    row.extend(fields.clone());
                }
                Value::Object(row)
            })
            .collect(),
    )
}

pub fn completed_json(tasks: &[CompletedTask], newest_first: bool) -> Value {
    json!(ordered(tasks, newest_first))
}

pub fn activity_json(entries: &[ActivityEntry], newest_first: bool) -> Value {
    json!(ordered(entries, newest_first))
}
