use clap::Parser;
use clap::error::ErrorKind;
use std::io;
use task_cli::cli::{Cli, Command, collect_config_overrides};
use task_cli::menu::Menu;
use task_cli::render;
use task_core::TaskRepository;
use task_core::config::{Config, load_config_with_fallback, merge_overrides};
use task_core::error::AppError;
use task_core::model::Priority;
use task_core::storage::JsonStore;
use task_core::storage::json_store::store_path;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const COMMAND_INTERFACE: &str = "Rust-CLI";
const MENU_INTERFACE: &str = "Rust-Menu";
const LOG_ENV_VAR: &str = "TASK_MANAGER_LOG";

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("error"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn load_settings(raw_overrides: &[String]) -> Result<Config, AppError> {
    let loaded = load_config_with_fallback();
    if let Some(err) = loaded.error {
        eprintln!("WARNING: ignoring config file: {}", err);
    }
    let overrides = collect_config_overrides(raw_overrides).map_err(AppError::invalid_input)?;
    Ok(merge_overrides(&loaded.config, &overrides))
}

fn open_repository(config: &Config, interface: &str) -> Result<TaskRepository, AppError> {
    let path = store_path(config.store_path.as_deref())?;
    let repo = TaskRepository::open(JsonStore::new(path, config.interface_or(interface)))?;
    debug!(
        path = %repo.store().path().display(),
        interface = repo.store().interface(),
        open = repo.list_open().len(),
        "opened task list"
    );
    if let Some(reason) = repo.recovered() {
        eprintln!(
            "WARNING: {} could not be used ({}); started a new task list",
            repo.store().path().display(),
            reason
        );
    }
    Ok(repo)
}

fn run_menu(config: &Config) -> Result<(), AppError> {
    let mut repo = open_repository(config, MENU_INTERFACE)?;
    let stdin = io::stdin();
    let stdout = io::stdout();
    Menu::new(&mut repo, stdin.lock(), stdout.lock())
        .newest_first(config.newest_first)
        .run()
}

fn run_command(cli: Cli) -> Result<(), AppError> {
    let Cli {
        command,
        json,
        config_override,
    } = cli;
    let config = load_settings(&config_override)?;

    match command.unwrap_or(Command::Menu) {
        Command::Menu => run_menu(&config)?,
        Command::Add {
            name,
            priority,
            deadline,
        } => {
            let priority: Priority = priority.parse()?;
            let deadline = deadline.ok_or_else(|| {
                AppError::invalid_input("deadline is required (--deadline DD-MM-YYYY)")
            })?;
            let mut repo = open_repository(&config, COMMAND_INTERFACE)?;
            let task = repo.add_task(name.as_deref().unwrap_or_default(), priority, &deadline)?;
            if json {
                println!("{}", serde_json::json!(task));
            } else {
                println!("Task '{}' added successfully!", task.name());
            }
        }
        Command::List => {
            let repo = open_repository(&config, COMMAND_INTERFACE)?;
            let tasks = repo.list_open();
            if json {
                println!("{}", render::open_json(tasks));
            } else if tasks.is_empty() {
                println!("No active tasks.");
            } else {
                println!("{}", render::open_table(tasks));
            }
        }
        Command::Done { index } => {
            let mut repo = open_repository(&config, COMMAND_INTERFACE)?;
            let done = repo.complete_task(index)?;
            if json {
                println!("{}", serde_json::json!(done));
            } else {
                println!("Task '{}' marked as done!", done.name());
            }
        }
        Command::Delete { index } => {
            let mut repo = open_repository(&config, COMMAND_INTERFACE)?;
            let removed = repo.delete_task(index)?;
            if json {
                println!("{}", serde_json::json!(removed));
            } else {
                println!("Task '{}' deleted!", removed.name());
            }
        }
        Command::Completed { newest_first } => {
            let repo = open_repository(&config, COMMAND_INTERFACE)?;
            let tasks = repo.list_completed();
            let newest_first = newest_first || config.newest_first;
            if json {
                println!("{}", render::completed_json(tasks, newest_first));
            } else if tasks.is_empty() {
                println!("No completed tasks.");
            } else {
                println!("{}", render::completed_table(tasks, newest_first));
            }
        }
        Command::History { newest_first } => {
            let repo = open_repository(&config, COMMAND_INTERFACE)?;
            let entries = repo.list_activity();
            let newest_first = newest_first || config.newest_first;
            if json {
                println!("{}", render::activity_json(entries, newest_first));
            } else if entries.is_empty() {
                println!("No activity history.");
            } else {
                println!("{}", render::activity_table(entries, newest_first));
            }
        }
    }

    Ok(())
}

fn main() {
    init_tracing();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = err.print();
            return;
        }
        Err(err) => {
            eprintln!("ERROR: {}", normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    if let Err(err) = run_command(cli) {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}
