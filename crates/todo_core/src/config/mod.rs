use crate::error::AppError;
use crate::storage::StorageKind;
use crate::view::{Filter, SortMode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_ENV_VAR: &str = "TODOAPP_CONFIG_PATH";

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3001";
pub const DEFAULT_SERVER_URL: &str = "http://localhost:3001";

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bind_addr: Option<String>,
    #[serde(default)]
    pub storage: Option<StorageKind>,
    #[serde(default)]
    pub store_path: Option<PathBuf>,
    #[serde(default)]
    pub seed_demo: Option<bool>,
    #[serde(default)]
    pub log_level: Option<String>,
    #[serde(default)]
    pub server_url: Option<String>,
    #[serde(default)]
    pub default_filter: Option<Filter>,
    #[serde(default)]
    pub default_sort: Option<SortMode>,
}

impl Config {
    pub fn bind_addr(&self) -> &str {
        self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR)
    }

    pub fn storage(&self) -> StorageKind {
        self.storage.unwrap_or_default()
    }

    pub fn seed_demo(&self) -> bool {
        self.seed_demo.unwrap_or(false)
    }

    pub fn log_level<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.log_level.as_deref().unwrap_or(fallback)
    }

    pub fn server_url(&self) -> &str {
        self.server_url.as_deref().unwrap_or(DEFAULT_SERVER_URL)
    }

    pub fn filter(&self) -> Filter {
        self.default_filter.unwrap_or_default()
    }

    pub fn sort(&self) -> SortMode {
        self.default_sort.unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub error: Option<AppError>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub bind_addr: Option<String>,
    pub storage: Option<StorageKind>,
    pub store_path: Option<PathBuf>,
    pub seed_demo: Option<bool>,
    pub log_level: Option<String>,
    pub server_url: Option<String>,
    pub default_filter: Option<Filter>,
    pub default_sort: Option<SortMode>,
}

pub fn config_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata)
            .join("todoapp")
            .join(CONFIG_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("todoapp")
            .join(CONFIG_FILE_NAME))
    }
}

/// Never fails: a missing file yields defaults, an unreadable or malformed
/// one yields defaults plus the error for the caller to report.
pub fn load_config_with_fallback() -> ConfigLoad {
    match config_path() {
        Ok(path) => load_config_with_fallback_from_path(&path),
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

pub fn load_config_with_fallback_from_path(path: &Path) -> ConfigLoad {
    if !path.exists() {
        return ConfigLoad {
            config: Config::default(),
            error: None,
        };
    }

    match load_config_from_path(path) {
        Ok(config) => ConfigLoad {
            config,
            error: None,
        },
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

pub fn load_config_from_path(path: &Path) -> Result<Config, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    let config: Config = serde_json::from_str(&content).map_err(|err| {
        AppError::invalid_data(format!("invalid JSON in {}: {}", path.display(), err))
    })?;
    Ok(normalize_config(config))
}

fn normalize_config(mut config: Config) -> Config {
    config.server_url = config.server_url.and_then(|url| normalize_server_url(&url));
    config.bind_addr = config.bind_addr.and_then(|addr| non_blank(&addr));
    config.log_level = config.log_level.and_then(|level| non_blank(&level));
    config
}

/// Trims whitespace and trailing slashes; blank becomes `None`.
pub fn normalize_server_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn non_blank(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn merge_overrides(base: &Config, overrides: &ConfigOverrides) -> Config {
    let mut merged = base.clone();

    if let Some(bind_addr) = overrides.bind_addr.as_deref().and_then(non_blank) {
        merged.bind_addr = Some(bind_addr);
    }
    if let Some(storage) = overrides.storage {
        merged.storage = Some(storage);
    }
    if let Some(store_path) = overrides.store_path.as_ref() {
        merged.store_path = Some(store_path.clone());
    }
    if let Some(seed_demo) = overrides.seed_demo {
        merged.seed_demo = Some(seed_demo);
    }
    if let Some(log_level) = overrides.log_level.as_deref().and_then(non_blank) {
        merged.log_level = Some(log_level);
    }
    if let Some(server_url) = overrides.server_url.as_deref().and_then(normalize_server_url) {
        merged.server_url = Some(server_url);
    }
    if let Some(filter) = overrides.default_filter {
        merged.default_filter = Some(filter);
    }
    if let Some(sort) = overrides.default_sort {
        merged.default_sort = Some(sort);
    }

    merged
}
