//! Persistence collaborators for the task store.
//!
//! A backend only loads and saves a whole [`StoreState`]; all merging and
//! validation happens in [`crate::store::TaskStore`].

pub mod json_store;
pub mod memory;

use crate::error::AppError;
use crate::model::{Task, TaskId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub use json_store::JsonFileStorage;
pub use memory::MemoryStorage;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreState {
    pub tasks: Vec<Task>,
    /// Next id to hand out. Never decreases, so deleted ids are not reused.
    pub next_id: TaskId,
}

impl StoreState {
    /// Raises `next_id` above every live id.
    pub fn repair_next_id(&mut self) -> Result<(), AppError> {
        let floor = match self.tasks.iter().map(|task| task.id).max() {
            Some(max) => max.checked_add(1).ok_or_else(id_space_exhausted)?,
            None => 1,
        };
        if self.next_id < floor {
            self.next_id = floor;
        }
        Ok(())
    }

    pub fn allocate_id(&mut self) -> Result<TaskId, AppError> {
        self.repair_next_id()?;
        let id = self.next_id;
        self.next_id = id.checked_add(1).ok_or_else(id_space_exhausted)?;
        Ok(id)
    }

    pub fn position(&self, id: TaskId) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == id)
    }
}

fn id_space_exhausted() -> AppError {
    AppError::invalid_data("task id space exhausted")
}

pub trait TaskStorage: Send {
    fn load(&self) -> Result<StoreState, AppError>;

    fn save(&mut self, state: &StoreState) -> Result<(), AppError>;

    fn describe(&self) -> String;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    #[default]
    Memory,
    File,
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => f.write_str("memory"),
            Self::File => f.write_str("file"),
        }
    }
}

impl FromStr for StorageKind {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(Self::Memory),
            "file" | "json" => Ok(Self::File),
            other => Err(AppError::validation(format!(
                "storage must be 'memory' or 'file' (got '{other}')"
            ))),
        }
    }
}

/// Builds the backend for `kind`. The file backend uses `path` when given,
/// otherwise [`json_store::store_path`].
pub fn open_storage(kind: StorageKind, path: Option<&Path>) -> Result<Box<dyn TaskStorage>, AppError> {
    match kind {
        StorageKind::Memory => Ok(Box::new(MemoryStorage::new())),
        StorageKind::File => {
            let path = match path {
                Some(path) => path.to_path_buf(),
                None => json_store::store_path()?,
            };
            Ok(Box::new(JsonFileStorage::new(path)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{StorageKind, StoreState};
    use crate::model::{Priority, Task, TaskId};
    use time::macros::datetime;

    fn task(id: u64) -> Task {
        Task {
            id,
            text: format!("task {id}"),
            description: None,
            completed: false,
            created_at: datetime!(2025-06-09 04:00 UTC),
            due_date: None,
            priority: Priority::Medium,
        }
    }

    #[test]
    fn allocate_id_starts_at_one() {
        let mut state = StoreState::default();
        assert_eq!(state.allocate_id().unwrap(), 1);
        assert_eq!(state.allocate_id().unwrap(), 2);
    }

    #[test]
    fn repair_next_id_skips_past_existing_ids() {
        let mut state = StoreState {
            tasks: vec![task(3), task(9)],
            next_id: 2,
        };
        state.repair_next_id().unwrap();
        assert_eq!(state.next_id, 10);
    }

    #[test]
    fn repair_next_id_never_lowers_counter() {
        let mut state = StoreState {
            tasks: vec![task(1)],
            next_id: 42,
        };
        state.repair_next_id().unwrap();
        assert_eq!(state.allocate_id().unwrap(), 42);
    }

    #[test]
    fn allocate_id_reports_exhausted_id_space() {
        let mut state = StoreState {
            tasks: vec![task(TaskId::MAX - 2)],
            next_id: 0,
        };

        assert_eq!(state.allocate_id().unwrap(), TaskId::MAX - 1);
        let err = state.allocate_id().unwrap_err();
        assert_eq!(err.code(), "invalid_data");
        assert_eq!(err.message(), "task id space exhausted");
    }

    #[test]
    fn storage_kind_parses_aliases() {
        assert_eq!("JSON".parse::<StorageKind>().unwrap(), StorageKind::File);
        assert_eq!("memory".parse::<StorageKind>().unwrap(), StorageKind::Memory);
        assert!("redis".parse::<StorageKind>().is_err());
    }
}
