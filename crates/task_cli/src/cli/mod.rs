use clap::{Parser, Subcommand};
use task_core::config::{ConfigOverrides, canonical_key};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new task
    ///
    /// Example: task_manager add "Buy milk" --priority low --deadline 31-12-2030
    Add {
        name: Option<String>,
        /// high, medium or low
        #[arg(short, long, default_value = "medium")]
        priority: String,
        /// Due date as DD-MM-YYYY
        #[arg(short, long)]
        deadline: Option<String>,
    },
    /// List open tasks
    ///
    /// Example: task_manager list
    List,
    /// Mark an open task as done by its list number
    ///
    /// Example: task_manager done 1
    Done { index: usize },
    /// Delete an open task by its list number
    ///
    /// Example: task_manager delete 2
    Delete { index: usize },
    /// Show completed tasks
    ///
    /// Example: task_manager completed --newest-first
    Completed {
        #[arg(long)]
        newest_first: bool,
    },
    /// Show the activity history of the data file
    ///
    /// Example: task_manager history
    History {
        #[arg(long)]
        newest_first: bool,
    },
    /// Start the interactive menu
    ///
    /// Example: task_manager menu
    Menu,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    StorePath,
    Interface,
    NewestFirst,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let (key_raw, value_raw) = raw
        .trim()
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let field = canonical_key(key_raw);
    let target = match field.as_str() {
        "" => return Err("override key cannot be empty".to_string()),
        "store_path" | "store" => ConfigOverrideTarget::StorePath,
        "interface" => ConfigOverrideTarget::Interface,
        "newest_first" => ConfigOverrideTarget::NewestFirst,
        other => return Err(format!("unknown config field '{other}'")),
    };

    Ok(ParsedConfigOverride {
        target,
        value: value_raw.trim().to_string(),
    })
}

/// Folds every `--config-override` argument into one set of overrides.
pub fn collect_config_overrides(raw: &[String]) -> Result<ConfigOverrides, String> {
    let mut overrides = ConfigOverrides::default();

    for entry in raw {
        let parsed = parse_config_override(entry)?;
        match parsed.target {
            ConfigOverrideTarget::StorePath => overrides.store_path = Some(parsed.value),
            ConfigOverrideTarget::Interface => overrides.interface = Some(parsed.value),
            ConfigOverrideTarget::NewestFirst => {
                let flag = parse_bool(&parsed.value).ok_or_else(|| {
                    format!("newest_first expects true or false, got '{}'", parsed.value)
                })?;
                overrides.newest_first = Some(flag);
            }
        }
    }

    Ok(overrides)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}
