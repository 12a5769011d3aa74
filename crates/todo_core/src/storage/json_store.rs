use super::{StoreState, TaskStorage};
use crate::error::AppError;
use crate::model::{Task, TaskId};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const SCHEMA_VERSION: u32 = 1;
const STORE_FILE_NAME: &str = "todos.json";
const STORE_ENV_VAR: &str = "TODOAPP_STORE_PATH";

#[derive(Debug, Serialize, Deserialize)]
struct StoredTasks {
    schema_version: u32,
    #[serde(default)]
    next_id: TaskId,
    tasks: Vec<Task>,
}

/// A bare array is what the browser client kept under its `todos` key.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredFile {
    Versioned(StoredTasks),
    Legacy(Vec<Task>),
}

/// File-backed storage. Every load reads the whole file and every save
/// rewrites it.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

impl TaskStorage for JsonFileStorage {
    fn load(&self) -> Result<StoreState, AppError> {
        load_state(&self.path)
    }

    fn save(&mut self, state: &StoreState) -> Result<(), AppError> {
        save_state(&self.path, state)
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}

pub fn store_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(STORE_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join("todoapp").join(STORE_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("todoapp")
            .join(STORE_FILE_NAME))
    }
}

pub fn load_state(path: &Path) -> Result<StoreState, AppError> {
    if !path.exists() {
        return Ok(StoreState::default());
    }

    let content = std::fs::read_to_string(path).map_err(|err| AppError::io(err.to_string()))?;
    let stored: StoredFile = serde_json::from_str(&content).map_err(|err| {
        AppError::invalid_data(format!("invalid JSON in {}: {}", path.display(), err))
    })?;

    let mut state = match stored {
        StoredFile::Versioned(stored) => {
            if !(1..=SCHEMA_VERSION).contains(&stored.schema_version) {
                return Err(AppError::invalid_data("schema_version mismatch"));
            }
            StoreState {
                tasks: stored.tasks,
                next_id: stored.next_id,
            }
        }
        StoredFile::Legacy(tasks) => StoreState { tasks, next_id: 0 },
    };

    let mut seen = std::collections::HashSet::with_capacity(state.tasks.len());
    if let Some(duplicate) = state.tasks.iter().find(|task| !seen.insert(task.id)) {
        return Err(AppError::invalid_data(format!(
            "duplicate task id {}",
            duplicate.id
        )));
    }

    state.repair_next_id()?;
    Ok(state)
}

pub fn save_state(path: &Path, state: &StoreState) -> Result<(), AppError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|err| AppError::io(err.to_string()))?;
    }

    let stored = StoredTasks {
        schema_version: SCHEMA_VERSION,
        next_id: state.next_id,
        tasks: state.tasks.to_vec(),
    };
    let content = serde_json::to_string_pretty(&stored)
        .map_err(|err| AppError::invalid_data(err.to_string()))?;
    std::fs::write(path, content).map_err(|err| AppError::io(err.to_string()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, permissions).map_err(|err| AppError::io(err.to_string()))?;
    }

    Ok(())
}
