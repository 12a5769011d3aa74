use super::TodoBackend;
use std::path::Path;
use todo_core::error::AppError;
use todo_core::model::{Task, TaskId};
use todo_core::storage::{StorageKind, TaskStorage, open_storage};
use todo_core::store::TaskStore;
use todo_core::wire::{CreateTodoRequest, UpdateTodoRequest};

/// Runs operations in-process against a [`TaskStore`]; the JSON file is
/// re-read and rewritten on every call.
pub struct LocalBackend {
    store: TaskStore,
}

impl LocalBackend {
    pub fn open(path: Option<&Path>) -> Result<Self, AppError> {
        Ok(Self::with_storage(open_storage(StorageKind::File, path)?))
    }

    pub fn with_storage(storage: Box<dyn TaskStorage>) -> Self {
        Self {
            store: TaskStore::new(storage),
        }
    }
}

impl TodoBackend for LocalBackend {
    fn list(&self) -> Result<Vec<Task>, AppError> {
        self.store.list()
    }

    fn create(&self, request: CreateTodoRequest) -> Result<Task, AppError> {
        self.store.create(request.into_new_task()?)
    }

    fn update(&self, id: TaskId, request: UpdateTodoRequest) -> Result<Task, AppError> {
        self.store.update(id, request.into_patch()?)
    }

    fn delete(&self, id: TaskId) -> Result<(), AppError> {
        self.store.delete(id).map(|_| ())
    }

    fn describe(&self) -> String {
        self.store.describe()
    }
}
