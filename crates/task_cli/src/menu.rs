use crate::render::{activity_lines, completed_lines, open_lines};
use std::io::{BufRead, Write};
use task_core::TaskRepository;
use task_core::datetime::parse_deadline;
use task_core::error::AppError;
use task_core::model::{AUTHOR, Priority, task_name};

enum Step {
    Continue,
    Quit,
}

/// Numbered terminal menu over a repository. Input and output are generic
/// so sessions can be scripted.
pub struct Menu<'a, R, W> {
    repo: &'a mut TaskRepository,
    input: R,
    output: W,
    newest_first: bool,
}

impl<'a, R: BufRead, W: Write> Menu<'a, R, W> {
    pub fn new(repo: &'a mut TaskRepository, input: R, output: W) -> Self {
        Self {
            repo,
            input,
            output,
            newest_first: false,
        }
    }

    pub fn newest_first(mut self, newest_first: bool) -> Self {
        self.newest_first = newest_first;
        self
    }

    /// Runs until the user exits or input ends. Only errors the user cannot
    /// correct from the menu are returned.
    pub fn run(&mut self) -> Result<(), AppError> {
        loop {
            self.show_menu()?;
            let step = match self.prompt("\nEnter your choice (0-6): ")? {
                None => Ok(Step::Quit),
                Some(choice) => match choice.trim() {
                    "1" => self.list_tasks().map(|_| Step::Continue),
                    "2" => self.add_task(),
                    "3" => self.mark_done(),
                    "4" => self.delete_task(),
                    "5" => self.show_completed().map(|_| Step::Continue),
                    "6" => self.show_activity().map(|_| Step::Continue),
                    "0" => Ok(Step::Quit),
                    _ => self
                        .say("\nInvalid choice. Please try again.")
                        .map(|_| Step::Continue),
                },
            };

            match step {
                Ok(Step::Continue) => {}
                Ok(Step::Quit) => break,
                Err(err) if err.is_recoverable() => self.say(&format!("\nERROR: {err}"))?,
                Err(err) => return Err(err),
            }
        }

        self.say(&format!("\nGoodbye! Made by {AUTHOR}"))
    }

    fn show_menu(&mut self) -> Result<(), AppError> {
        self.say("\n=== Task Manager ===")?;
        self.say(
            "1. List Tasks\n\
             2. Add Task\n\
             3. Mark Task as Done\n\
             4. Delete Task\n\
             5. Show Completed Tasks\n\
             6. Show Activity History\n\
             0. Exit",
        )
    }

    fn list_tasks(&mut self) -> Result<(), AppError> {
        self.heading("ACTIVE TASKS")?;
        let lines = open_lines(self.repo.list_open());
        if lines.is_empty() {
            return self.say("No active tasks.");
        }
        self.say_all(&lines)
    }

    fn add_task(&mut self) -> Result<Step, AppError> {
        self.say("\n=== Add New Task ===\n")?;
        let Some(raw_name) = self.prompt("Enter task name: ")? else {
            return Ok(Step::Quit);
        };
        let name = match task_name(&raw_name) {
            Ok(name) => name.to_string(),
            Err(_) => {
                self.say("Task name cannot be empty!")?;
                return Ok(Step::Continue);
            }
        };

        self.say("\nPriority:\n1. High\n2. Medium\n3. Low")?;
        let Some(choice) = self.prompt("Choose priority (1-3): ")? else {
            return Ok(Step::Quit);
        };
        let priority = priority_choice(&choice);

        let deadline = loop {
            let Some(raw) = self.prompt("Enter deadline (DD-MM-YYYY): ")? else {
                return Ok(Step::Quit);
            };
            match parse_deadline(&raw) {
                Ok(deadline) => break deadline,
                Err(_) => self.say("Invalid date format! Please use DD-MM-YYYY")?,
            }
        };

        let task = self.repo.add_task(&name, priority, &deadline)?;
        self.say(&format!("\nTask '{}' added successfully!", task.name()))?;
        Ok(Step::Continue)
    }

    fn mark_done(&mut self) -> Result<Step, AppError> {
        if self.repo.list_open().is_empty() {
            self.say("\nNo tasks to mark as done!")?;
            return Ok(Step::Continue);
        }

        self.say("\n=== Mark Task as Done ===")?;
        self.list_tasks()?;
        let Some(index) = self.prompt_index("\nEnter task number to mark as done: ")? else {
            return Ok(Step::Quit);
        };
        if let Some(index) = index {
            let done = self.repo.complete_task(index)?;
            self.say(&format!("\nTask '{}' marked as done!", done.name()))?;
        }
        Ok(Step::Continue)
    }

    fn delete_task(&mut self) -> Result<Step, AppError> {
        if self.repo.list_open().is_empty() {
            self.say("\nNo tasks to delete!")?;
            return Ok(Step::Continue);
        }

        self.say("\n=== Delete Task ===")?;
        self.list_tasks()?;
        let Some(index) = self.prompt_index("\nEnter task number to delete: ")? else {
            return Ok(Step::Quit);
        };
        if let Some(index) = index {
            let removed = self.repo.delete_task(index)?;
            self.say(&format!("\nTask '{}' deleted!", removed.name()))?;
        }
        Ok(Step::Continue)
    }

    fn show_completed(&mut self) -> Result<(), AppError> {
        self.heading("COMPLETED TASKS")?;
        let lines = completed_lines(self.repo.list_completed(), self.newest_first);
        if lines.is_empty() {
            return self.say("No completed tasks.");
        }
        self.say_all(&lines)
    }

    fn show_activity(&mut self) -> Result<(), AppError> {
        self.heading("ACTIVITY HISTORY")?;
        let lines = activity_lines(self.repo.list_activity(), self.newest_first);
        if lines.is_empty() {
            return self.say("No activity history.");
        }
        self.say_all(&lines)
    }

    /// `None` on end of input, `Some(None)` when the answer was not a number.
    fn prompt_index(&mut self, text: &str) -> Result<Option<Option<usize>>, AppError> {
        let Some(raw) = self.prompt(text)? else {
            return Ok(None);
        };
        match raw.trim().parse::<usize>() {
            Ok(index) => Ok(Some(Some(index))),
            Err(_) => {
                self.say("\nPlease enter a valid number!")?;
                Ok(Some(None))
            }
        }
    }

    fn prompt(&mut self, text: &str) -> Result<Option<String>, AppError> {
        write!(self.output, "{text}").map_err(|err| AppError::io(err.to_string()))?;
        self.output
            .flush()
            .map_err(|err| AppError::io(err.to_string()))?;

        let mut line = String::new();
        let bytes = self
            .input
            .read_line(&mut line)
            .map_err(|err| AppError::io(err.to_string()))?;
        if bytes == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn heading(&mut self, title: &str) -> Result<(), AppError> {
        self.say(&format!("\n=== {title} ===\n"))
    }

    fn say(&mut self, text: &str) -> Result<(), AppError> {
        writeln!(self.output, "{text}").map_err(|err| AppError::io(err.to_string()))
    }

    fn say_all(&mut self, lines: &[String]) -> Result<(), AppError> {
        for line in lines {
            self.say(line)?;
        }
        Ok(())
    }
}

/// Menu numbers or names; anything else falls back to medium.
fn priority_choice(raw: &str) -> Priority {
    match raw.trim() {
        "1" => Priority::High,
        "2" => Priority::Medium,
        "3" => Priority::Low,
        other => other.parse().unwrap_or_default(),
    }
}
