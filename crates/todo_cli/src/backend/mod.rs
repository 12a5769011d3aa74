//! Where the client sends its operations: the HTTP server or a local store.

mod local;
mod remote;

pub use local::LocalBackend;
pub use remote::RemoteBackend;

use todo_core::error::AppError;
use todo_core::model::{Task, TaskId};
use todo_core::wire::{CreateTodoRequest, UpdateTodoRequest};

pub trait TodoBackend {
    fn list(&self) -> Result<Vec<Task>, AppError>;

    fn create(&self, request: CreateTodoRequest) -> Result<Task, AppError>;

    fn update(&self, id: TaskId, request: UpdateTodoRequest) -> Result<Task, AppError>;

    fn delete(&self, id: TaskId) -> Result<(), AppError>;

    fn describe(&self) -> String;
}
