pub(crate) mod task;

pub use task::{NewTask, Priority, Task, TaskId, TaskPatch};
