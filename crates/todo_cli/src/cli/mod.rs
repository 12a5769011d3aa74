use clap::{Parser, Subcommand};
use std::path::PathBuf;
use todo_core::config::ConfigOverrides;
use todo_core::error::AppError;
use todo_core::model::{Priority, TaskId};
use todo_core::view::{Filter, SortMode};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Without a command, start the interactive prompt
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Work on the local JSON store instead of the server
    #[arg(long, global = true)]
    pub local: bool,

    /// Server base URL (default http://localhost:3001)
    #[arg(long, value_name = "URL", env = "TODOAPP_SERVER_URL", global = true)]
    pub server: Option<String>,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new todo
    ///
    /// Example: todo add "Buy milk" --priority high --due 2025-12-24
    Add {
        text: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        /// RFC3339, "YYYY-MM-DD HH:MM" or "YYYY-MM-DD"
        #[arg(long)]
        due: Option<String>,
        #[arg(short, long)]
        priority: Option<Priority>,
    },
    /// List todos
    ///
    /// Example: todo list --filter active --sort priority
    List {
        /// all, active or completed
        #[arg(short, long)]
        filter: Option<Filter>,
        /// priority, dueDate or date (newest first)
        #[arg(short, long)]
        sort: Option<SortMode>,
        /// Re-fetch even if a snapshot is cached
        #[arg(long)]
        refresh: bool,
    },
    /// Flip a todo between active and completed
    ///
    /// Example: todo toggle 1
    Toggle { id: TaskId },
    /// Change fields of a todo
    ///
    /// Example: todo edit 1 --text "Buy oat milk" --priority low
    /// Example: todo edit 1 --clear-due
    Edit {
        id: TaskId,
        #[arg(long)]
        text: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,
        #[arg(long)]
        clear_due: bool,
        #[arg(short, long)]
        priority: Option<Priority>,
        #[arg(long, value_name = "true|false")]
        completed: Option<bool>,
    },
    /// Delete a todo
    ///
    /// Example: todo delete 1
    Delete { id: TaskId },
    /// Show details of a todo
    ///
    /// Example: todo show 1
    Show { id: TaskId },
}

/// Flag name used to identify config override arguments by the runtime.
pub const CONFIG_OVERRIDE_FLAG: &str = "--config-override";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    ServerUrl,
    StorePath,
    Filter,
    Sort,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let trimmed = raw.trim();
    let (key_raw, value_raw) = trimmed
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let value = value_raw.trim().to_string();
    let canonical_field =
        canonicalize_flag_name(key_raw).ok_or_else(|| "override key cannot be empty".to_string())?;

    let target = match canonical_field.as_str() {
        "server_url" | "server" => ConfigOverrideTarget::ServerUrl,
        "store_path" | "store" => ConfigOverrideTarget::StorePath,
        "filter" | "default_filter" => ConfigOverrideTarget::Filter,
        "sort" | "default_sort" => ConfigOverrideTarget::Sort,
        other => return Err(format!("unknown config field '{other}'")),
    };

    if value.is_empty() {
        return Err(format!("override '{canonical_field}' needs a value"));
    }

    Ok(ParsedConfigOverride { target, value })
}

/// Folds `--config-override` values (and `--server`, which wins) into
/// [`ConfigOverrides`].
pub fn collect_overrides(cli: &Cli) -> Result<ConfigOverrides, AppError> {
    let mut overrides = ConfigOverrides::default();

    for raw in &cli.config_override {
        let parsed = parse_config_override(raw)
            .map_err(|message| AppError::validation(format!("{CONFIG_OVERRIDE_FLAG}: {message}")))?;
        match parsed.target {
            ConfigOverrideTarget::ServerUrl => overrides.server_url = Some(parsed.value),
            ConfigOverrideTarget::StorePath => {
                overrides.store_path = Some(PathBuf::from(parsed.value))
            }
            ConfigOverrideTarget::Filter => overrides.default_filter = Some(parsed.value.parse()?),
            ConfigOverrideTarget::Sort => overrides.default_sort = Some(parsed.value.parse()?),
        }
    }

    if let Some(server) = cli.server.as_ref() {
        overrides.server_url = Some(server.clone());
    }

    Ok(overrides)
}

/// Inside the interactive prompt the backend and config are already fixed,
/// so flags that would change them are refused instead of ignored.
pub fn check_session_flags(line: &Cli, launch: &Cli) -> Result<(), AppError> {
    let offending = if line.local {
        Some("--local")
    } else if line.server != launch.server {
        Some("--server")
    } else if !line.config_override.is_empty() {
        Some(CONFIG_OVERRIDE_FLAG)
    } else {
        None
    };

    match offending {
        Some(flag) => Err(AppError::validation(format!(
            "{flag} can only be given when starting todo"
        ))),
        None => Ok(()),
    }
}

fn canonicalize_flag_name(name: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
