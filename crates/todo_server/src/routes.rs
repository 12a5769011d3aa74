//! `/api/todos` routes.

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use todo_core::error::AppError;
use todo_core::model::{Task, TaskId};
use todo_core::store::{NOT_FOUND_MESSAGE, TaskStore};
use todo_core::wire::{CreateTodoRequest, UpdateTodoRequest};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::ApiError;

pub type SharedStore = Arc<TaskStore>;

pub fn create_router(store: SharedStore) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/todos", get(list_todos).post(create_todo))
        .route("/api/todos/{id}", put(update_todo).delete(delete_todo))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(store)
}

async fn list_todos(State(store): State<SharedStore>) -> Result<Json<Vec<Task>>, ApiError> {
    Ok(Json(store.list()?))
}

async fn create_todo(
    State(store): State<SharedStore>,
    payload: Result<Json<CreateTodoRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let Json(request) = payload?;
    let task = store.create(request.into_new_task()?)?;
    tracing::info!(id = task.id, "todo created");
    Ok((StatusCode::CREATED, Json(task)))
}

async fn update_todo(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateTodoRequest>, JsonRejection>,
) -> Result<Json<Task>, ApiError> {
    let id = parse_id(&id)?;
    let Json(request) = payload?;
    let task = store.update(id, request.into_patch()?)?;
    tracing::info!(id, "todo updated");
    Ok(Json(task))
}

async fn delete_todo(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    store.delete(id)?;
    tracing::info!(id, "todo deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Ids are numeric; anything else cannot name a stored todo.
fn parse_id(raw: &str) -> Result<TaskId, AppError> {
    raw.trim()
        .parse::<TaskId>()
        .map_err(|_| AppError::not_found(NOT_FOUND_MESSAGE))
}
