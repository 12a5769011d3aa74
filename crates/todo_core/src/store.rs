use crate::datetime;
use crate::error::AppError;
use crate::model::task::{normalize_description, normalize_text};
use crate::model::{NewTask, Priority, Task, TaskId, TaskPatch};
use crate::storage::{MemoryStorage, StoreState, TaskStorage};
use parking_lot::Mutex;
use time::macros::datetime;

pub const NOT_FOUND_MESSAGE: &str = "Todo not found";

/// Owns the canonical task collection.
///
/// Every operation holds the lock for its whole load, mutate and save cycle,
/// so calls are serialized and racing updates resolve last-write-wins.
pub struct TaskStore {
    storage: Mutex<Box<dyn TaskStorage>>,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl TaskStore {
    pub fn new(storage: Box<dyn TaskStorage>) -> Self {
        Self {
            storage: Mutex::new(storage),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStorage::new()))
    }

    pub fn describe(&self) -> String {
        self.storage.lock().describe()
    }

    /// All tasks in creation order.
    pub fn list(&self) -> Result<Vec<Task>, AppError> {
        let storage = self.storage.lock();
        Ok(storage.load()?.tasks)
    }

    pub fn get(&self, id: TaskId) -> Result<Task, AppError> {
        let storage = self.storage.lock();
        storage
            .load()?
            .tasks
            .into_iter()
            .find(|task| task.id == id)
            .ok_or_else(|| AppError::not_found(NOT_FOUND_MESSAGE))
    }

    pub fn create(&self, new_task: NewTask) -> Result<Task, AppError> {
        let text = normalize_text(&new_task.text)?;

        self.mutate(|state| {
            let task = Task {
                id: state.allocate_id()?,
                text,
                description: normalize_description(new_task.description),
                completed: false,
                created_at: datetime::now(),
                due_date: new_task.due_date,
                priority: new_task.priority.unwrap_or_default(),
            };
            state.tasks.push(task.clone());
            tracing::debug!(id = task.id, priority = %task.priority, "created todo");
            Ok(task)
        })
    }

    pub fn update(&self, id: TaskId, patch: TaskPatch) -> Result<Task, AppError> {
        self.mutate(|state| {
            let index = state
                .position(id)
                .ok_or_else(|| AppError::not_found(NOT_FOUND_MESSAGE))?;
            let task = &mut state.tasks[index];
            patch.apply_to(task)?;
            tracing::debug!(id, completed = task.completed, "updated todo");
            Ok(task.clone())
        })
    }

    /// Removes the task and hands it back. Deleting an id that is already
    /// gone reports `NotFound`.
    pub fn delete(&self, id: TaskId) -> Result<Task, AppError> {
        self.mutate(|state| {
            let index = state
                .position(id)
                .ok_or_else(|| AppError::not_found(NOT_FOUND_MESSAGE))?;
            let removed = state.tasks.remove(index);
            tracing::debug!(id, "deleted todo");
            Ok(removed)
        })
    }

    /// Inserts the two sample todos when the store is empty. Returns how many
    /// were added.
    pub fn seed_demo(&self) -> Result<usize, AppError> {
        self.mutate(|state| {
            if !state.tasks.is_empty() {
                return Ok(0);
            }
            let created_at = datetime!(2025-06-09 04:00 UTC);
            for (text, description, completed, priority) in [
                ("Test Todo 1", "This is a test todo", false, Priority::Medium),
                ("Test Todo 2", "This is another test todo", true, Priority::High),
            ] {
                let id = state.allocate_id()?;
                state.tasks.push(Task {
                    id,
                    text: text.to_string(),
                    description: Some(description.to_string()),
                    completed,
                    created_at,
                    due_date: Some(created_at),
                    priority,
                });
            }
            Ok(state.tasks.len())
        })
    }

    /// Nothing is saved when `apply` fails.
    fn mutate<T, F>(&self, apply: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut StoreState) -> Result<T, AppError>,
    {
        let mut storage = self.storage.lock();
        let mut state = storage.load()?;
        let result = apply(&mut state)?;
        if let Err(err) = storage.save(&state) {
            tracing::error!(storage = %storage.describe(), error = %err, "failed to persist todos");
            return Err(err);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::TaskStore;
    use crate::model::{NewTask, Priority, TaskPatch};
    use crate::storage::{JsonFileStorage, MemoryStorage};
    use std::collections::HashSet;
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::{SystemTime, UNIX_EPOCH};
    use time::macros::datetime;

    fn temp_path(file_name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("todoapp-{nanos}-{file_name}"))
    }

    #[test]
    fn create_assigns_unique_ids_and_defaults() {
        let store = TaskStore::in_memory();
        let first = store.create(NewTask::new("first")).unwrap();
        let second = store.create(NewTask::new("second")).unwrap();

        assert_ne!(first.id, second.id);
        assert!(!first.completed);
        assert_eq!(first.priority, Priority::Medium);
        assert_eq!(first.description, None);
        assert_eq!(first.due_date, None);
    }

    #[test]
    fn create_trims_text_and_keeps_optional_fields() {
        let store = TaskStore::in_memory();
        let due = datetime!(2025-07-01 12:00 UTC);
        let task = store
            .create(
                NewTask::new("  Buy milk ")
                    .with_description("semi-skimmed")
                    .with_due_date(due)
                    .with_priority(Priority::Low),
            )
            .unwrap();

        assert_eq!(task.text, "Buy milk");
        assert_eq!(task.description.as_deref(), Some("semi-skimmed"));
        assert_eq!(task.due_date, Some(due));
        assert_eq!(task.priority, Priority::Low);
    }

    #[test]
    fn create_rejects_blank_text_and_leaves_collection_unchanged() {
        let store = TaskStore::in_memory();
        store.create(NewTask::new("keep")).unwrap();

        for text in ["", "   "] {
            let err = store.create(NewTask::new(text)).unwrap_err();
            assert_eq!(err.code(), "validation_error");
        }

        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn list_preserves_creation_order() {
        let store = TaskStore::in_memory();
        for text in ["a", "b", "c"] {
            store.create(NewTask::new(text)).unwrap();
        }

        let texts: Vec<String> = store.list().unwrap().into_iter().map(|t| t.text).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
    }

    #[test]
    fn update_flips_only_completed() {
        let store = TaskStore::in_memory();
        let created = store
            .create(NewTask::new("demo").with_priority(Priority::High))
            .unwrap();

        let updated = store.update(created.id, TaskPatch::completed(true)).unwrap();

        assert!(updated.completed);
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.text, created.text);
        assert_eq!(updated.priority, created.priority);
        assert_eq!(updated.due_date, created.due_date);
        assert_eq!(store.get(created.id).unwrap(), updated);
    }

    #[test]
    fn update_missing_id_reports_not_found() {
        let store = TaskStore::in_memory();
        store.create(NewTask::new("demo")).unwrap();
        let before = store.list().unwrap();

        let err = store.update(99, TaskPatch::completed(true)).unwrap_err();

        assert_eq!(err.code(), "not_found");
        assert_eq!(err.message(), "Todo not found");
        assert_eq!(store.list().unwrap(), before);
    }

    #[test]
    fn update_rejects_blank_text() {
        let store = TaskStore::in_memory();
        let created = store.create(NewTask::new("demo")).unwrap();
        let patch = TaskPatch {
            text: Some(" ".to_string()),
            ..TaskPatch::default()
        };

        let err = store.update(created.id, patch).unwrap_err();

        assert_eq!(err.code(), "validation_error");
        assert_eq!(store.get(created.id).unwrap(), created);
    }

    #[test]
    fn delete_twice_reports_not_found() {
        let store = TaskStore::in_memory();
        let created = store.create(NewTask::new("demo")).unwrap();

        let removed = store.delete(created.id).unwrap();
        assert_eq!(removed.id, created.id);
        assert!(store.list().unwrap().iter().all(|t| t.id != created.id));

        let err = store.delete(created.id).unwrap_err();
        assert_eq!(err.code(), "not_found");
    }

    #[test]
    fn deleted_ids_are_not_reused() {
        let store = TaskStore::in_memory();
        let first = store.create(NewTask::new("first")).unwrap();
        let second = store.create(NewTask::new("second")).unwrap();
        store.delete(second.id).unwrap();

        let third = store.create(NewTask::new("third")).unwrap();

        assert!(third.id > second.id);
        assert_ne!(third.id, first.id);
    }

    #[test]
    fn ids_stay_unique_across_many_creates() {
        let store = TaskStore::in_memory();
        let mut seen = HashSet::new();
        for n in 0..50 {
            let task = store.create(NewTask::new(format!("task {n}"))).unwrap();
            assert!(seen.insert(task.id));
            if n % 3 == 0 {
                store.delete(task.id).unwrap();
            }
        }
    }

    #[test]
    fn concurrent_creates_are_serialized() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 25;

        let store = Arc::new(TaskStore::in_memory());
        std::thread::scope(|scope| {
            for worker in 0..THREADS {
                let store = Arc::clone(&store);
                scope.spawn(move || {
                    for n in 0..PER_THREAD {
                        store
                            .create(NewTask::new(format!("worker {worker} task {n}")))
                            .unwrap();
                    }
                });
            }
        });

        let tasks = store.list().unwrap();
        let ids: HashSet<u64> = tasks.iter().map(|task| task.id).collect();
        assert_eq!(tasks.len(), THREADS * PER_THREAD);
        assert_eq!(ids.len(), THREADS * PER_THREAD);
    }

    #[test]
    fn racing_updates_keep_one_of_the_writes() {
        let store = Arc::new(TaskStore::in_memory());
        let id = store.create(NewTask::new("shared")).unwrap().id;

        std::thread::scope(|scope| {
            for text in ["from a", "from b"] {
                let store = Arc::clone(&store);
                scope.spawn(move || {
                    let patch = TaskPatch {
                        text: Some(text.to_string()),
                        ..TaskPatch::default()
                    };
                    store.update(id, patch).unwrap();
                });
            }
        });

        let stored = store.get(id).unwrap();
        assert!(stored.text == "from a" || stored.text == "from b");
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn file_with_last_possible_id_reports_invalid_data() {
        let path = temp_path("store-max-id.json");
        std::fs::write(
            &path,
            r#"[{"id": 18446744073709551615, "text": "last", "createdAt": "2025-06-09T04:00:00Z"}]"#,
        )
        .unwrap();
        let store = TaskStore::new(Box::new(JsonFileStorage::new(&path)));

        let listed = store.list().unwrap_err();
        let created = store.create(NewTask::new("next")).unwrap_err();
        std::fs::remove_file(&path).ok();

        assert_eq!(listed.code(), "invalid_data");
        assert_eq!(created.code(), "invalid_data");
    }

    #[test]
    fn end_to_end_create_update_delete() {
        let store = TaskStore::in_memory();
        let created = store
            .create(NewTask::new("Buy milk").with_priority(Priority::High))
            .unwrap();

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].text, "Buy milk");
        assert!(!listed[0].completed);
        assert_eq!(listed[0].priority, Priority::High);

        store.update(created.id, TaskPatch::completed(true)).unwrap();
        assert!(store.list().unwrap()[0].completed);

        store.delete(created.id).unwrap();
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn file_backed_store_keeps_counter_across_reopen() {
        let path = temp_path("store-reopen.json");
        let store = TaskStore::new(Box::new(JsonFileStorage::new(&path)));
        let first = store.create(NewTask::new("first")).unwrap();
        let second = store.create(NewTask::new("second")).unwrap();
        store.delete(second.id).unwrap();
        drop(store);

        let reopened = TaskStore::new(Box::new(JsonFileStorage::new(&path)));
        let third = reopened.create(NewTask::new("third")).unwrap();
        let ids: Vec<u64> = reopened.list().unwrap().iter().map(|t| t.id).collect();
        std::fs::remove_file(&path).ok();

        assert_eq!(ids, vec![first.id, third.id]);
        assert!(third.id > second.id);
    }

    #[test]
    fn seed_demo_only_fills_empty_store() {
        let store = TaskStore::new(Box::new(MemoryStorage::new()));
        assert_eq!(store.seed_demo().unwrap(), 2);
        assert_eq!(store.seed_demo().unwrap(), 0);

        let tasks = store.list().unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[1].priority, Priority::High);
        assert!(tasks[1].completed);
    }
}
