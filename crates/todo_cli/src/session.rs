use crate::backend::TodoBackend;
use todo_core::error::AppError;
use todo_core::model::{Task, TaskId};
use todo_core::store::NOT_FOUND_MESSAGE;
use todo_core::view::{self, Filter, SortMode};
use todo_core::wire::{CreateTodoRequest, UpdateTodoRequest};

/// A backend plus the last list it returned.
///
/// The snapshot only changes after the backend confirms an operation; a
/// failed call leaves it as it was.
pub struct Session {
    backend: Box<dyn TodoBackend>,
    todos: Vec<Task>,
    loaded: bool,
}

impl Session {
    pub fn new(backend: Box<dyn TodoBackend>) -> Self {
        Self {
            backend,
            todos: Vec::new(),
            loaded: false,
        }
    }

    pub fn describe(&self) -> String {
        self.backend.describe()
    }

    pub fn todos(&self) -> &[Task] {
        &self.todos
    }

    pub fn refresh(&mut self) -> Result<&[Task], AppError> {
        let todos = self.backend.list()?;
        self.todos = todos;
        self.loaded = true;
        Ok(&self.todos)
    }

    /// Filtered and sorted copy of the snapshot, fetching it first when it
    /// has never been loaded or `refresh` is set.
    pub fn view(&mut self, filter: Filter, sort: SortMode, refresh: bool) -> Result<Vec<Task>, AppError> {
        if refresh || !self.loaded {
            self.refresh()?;
        }
        Ok(view::apply(&self.todos, filter, sort))
    }

    pub fn add(&mut self, request: CreateTodoRequest) -> Result<Task, AppError> {
        let task = self.backend.create(request)?;
        self.refresh_after_mutation();
        Ok(task)
    }

    pub fn update(&mut self, id: TaskId, request: UpdateTodoRequest) -> Result<Task, AppError> {
        let task = self.backend.update(id, request)?;
        self.refresh_after_mutation();
        Ok(task)
    }

    /// Re-reads the list first so the flip is based on the current state,
    /// not on a snapshot another client may have changed.
    pub fn toggle(&mut self, id: TaskId) -> Result<Task, AppError> {
        self.refresh()?;
        let completed = self.find(id)?.completed;
        self.update(
            id,
            UpdateTodoRequest {
                completed: Some(!completed),
                ..UpdateTodoRequest::default()
            },
        )
    }

    pub fn delete(&mut self, id: TaskId) -> Result<(), AppError> {
        self.backend.delete(id)?;
        self.refresh_after_mutation();
        Ok(())
    }

    pub fn show(&mut self, id: TaskId) -> Result<Task, AppError> {
        self.find(id).cloned()
    }

    fn find(&mut self, id: TaskId) -> Result<&Task, AppError> {
        let cached = self.loaded && self.todos.iter().any(|task| task.id == id);
        if !cached {
            self.refresh()?;
        }
        self.todos
            .iter()
            .find(|task| task.id == id)
            .ok_or_else(|| AppError::not_found(NOT_FOUND_MESSAGE))
    }

    fn refresh_after_mutation(&mut self) {
        if let Err(err) = self.refresh() {
            tracing::warn!(error = %err, "refresh after mutation failed");
        }
    }
}
