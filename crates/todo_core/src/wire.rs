//! JSON bodies exchanged over `/api/todos`, shared by server and client.

use crate::datetime::parse_due_date;
use crate::error::AppError;
use crate::model::{NewTask, Priority, TaskPatch};
use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;

/// `POST /api/todos`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodoRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

impl CreateTodoRequest {
    pub fn into_new_task(self) -> Result<NewTask, AppError> {
        let due_date = match self.due_date {
            Some(raw) => optional_due_date(&raw)?,
            None => None,
        };

        let mut new_task = NewTask::new(self.text.unwrap_or_default());
        if let Some(description) = self.description {
            new_task = new_task.with_description(description);
        }
        if let Some(due_date) = due_date {
            new_task = new_task.with_due_date(due_date);
        }
        if let Some(priority) = self.priority {
            new_task = new_task.with_priority(priority);
        }
        Ok(new_task)
    }
}

/// `PUT /api/todos/{id}`. Fields that are absent stay untouched; `null`
/// (or an empty string) clears `description` and `dueDate`. Keys outside
/// this set, `id` and `createdAt` included, are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodoRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

impl UpdateTodoRequest {
    pub fn into_patch(self) -> Result<TaskPatch, AppError> {
        let due_date = match self.due_date {
            Some(Some(raw)) => Some(optional_due_date(&raw)?),
            Some(None) => Some(None),
            None => None,
        };

        Ok(TaskPatch {
            text: self.text,
            description: self.description,
            completed: self.completed,
            due_date,
            priority: self.priority,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl From<&AppError> for ErrorBody {
    fn from(err: &AppError) -> Self {
        Self {
            error: err.code().to_string(),
            message: err.message().to_string(),
        }
    }
}

fn optional_due_date(raw: &str) -> Result<Option<OffsetDateTime>, AppError> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    parse_due_date(raw).map(Some)
}

/// Distinguishes an explicit `null` (`Some(None)`) from a missing key (`None`).
fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
