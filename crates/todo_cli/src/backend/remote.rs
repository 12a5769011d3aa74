use super::TodoBackend;
use std::time::Duration;
use todo_core::error::AppError;
use todo_core::model::{Task, TaskId};
use todo_core::store::NOT_FOUND_MESSAGE;
use todo_core::wire::{CreateTodoRequest, ErrorBody, UpdateTodoRequest};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Fetch,
    Create,
    Update,
    Delete,
}

impl Operation {
    fn failure_message(self) -> &'static str {
        match self {
            Self::Fetch => "Failed to fetch todos",
            Self::Create => "Failed to create todo",
            Self::Update => "Failed to update todo",
            Self::Delete => "Failed to delete todo",
        }
    }

    fn network_message(self) -> &'static str {
        match self {
            Self::Fetch => "Network error while fetching todos",
            Self::Create => "Network error while creating todo",
            Self::Update => "Network error while updating todo",
            Self::Delete => "Network error while deleting todo",
        }
    }
}

/// Talks to the todo server's REST API.
pub struct RemoteBackend {
    agent: ureq::Agent,
    base_url: String,
}

impl RemoteBackend {
    pub fn new(base_url: &str) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn todos_url(&self) -> String {
        format!("{}/api/todos", self.base_url)
    }

    fn todo_url(&self, id: TaskId) -> String {
        format!("{}/api/todos/{id}", self.base_url)
    }
}

impl TodoBackend for RemoteBackend {
    fn list(&self) -> Result<Vec<Task>, AppError> {
        let url = self.todos_url();
        tracing::debug!(%url, "GET");
        let response = self
            .agent
            .get(&url)
            .call()
            .map_err(|err| request_error(err, Operation::Fetch))?;
        read_json(response, Operation::Fetch)
    }

    fn create(&self, request: CreateTodoRequest) -> Result<Task, AppError> {
        let url = self.todos_url();
        tracing::debug!(%url, "POST");
        let response = self
            .agent
            .post(&url)
            .send_json(&request)
            .map_err(|err| request_error(err, Operation::Create))?;
        read_json(response, Operation::Create)
    }

    fn update(&self, id: TaskId, request: UpdateTodoRequest) -> Result<Task, AppError> {
        let url = self.todo_url(id);
        tracing::debug!(%url, "PUT");
        let response = self
            .agent
            .put(&url)
            .send_json(&request)
            .map_err(|err| request_error(err, Operation::Update))?;
        read_json(response, Operation::Update)
    }

    fn delete(&self, id: TaskId) -> Result<(), AppError> {
        let url = self.todo_url(id);
        tracing::debug!(%url, "DELETE");
        self.agent
            .delete(&url)
            .call()
            .map_err(|err| request_error(err, Operation::Delete))?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }
}

fn read_json<T: serde::de::DeserializeOwned>(
    response: ureq::Response,
    operation: Operation,
) -> Result<T, AppError> {
    response.into_json().map_err(|err| {
        tracing::debug!(error = %err, "unreadable response body");
        AppError::transport(operation.failure_message())
    })
}

fn request_error(err: ureq::Error, operation: Operation) -> AppError {
    match err {
        ureq::Error::Status(404, _) => AppError::not_found(NOT_FOUND_MESSAGE),
        ureq::Error::Status(400, response) => {
            let message = response
                .into_json::<ErrorBody>()
                .map(|body| body.message)
                .unwrap_or_else(|_| operation.failure_message().to_string());
            AppError::validation(message)
        }
        ureq::Error::Status(status, _) => {
            tracing::debug!(status, "server error");
            AppError::transport(format!("{} (HTTP {status})", operation.failure_message()))
        }
        ureq::Error::Transport(transport) => {
            tracing::debug!(error = %transport, "transport failure");
            AppError::transport(operation.network_message())
        }
    }
}
