use axum::{extract::{Path, State}, response::{IntoResponse, Response}, routing::{get, patch}, Json, Router};
use http::StatusCode;

use crate::{
    application::task_service::{ServiceError, TaskService},
    domain::task::{CreateTask, Task, TaskId, TaskPatch},
    http::types::{ApiError, DeleteResult},
};

#[derive(Clone)]
pub struct AppState<S: TaskService> { pub service: S }

pub fn router<S: TaskService + Clone + Send + Sync + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/todo", get(list_tasks::<S>).post(create_task::<S>))
        .route("/todo/:id", get(get_task::<S>).patch(update_task::<S>).delete(delete_task::<S>))
        .route("/todo/:id/toggle", patch(toggle_task::<S>))
        .with_state(state)
}

async fn list_tasks<S: TaskService>(State(state): State<AppState<S>>) -> Result<Json<Vec<Task>>, ApiError> {
    Ok(Json(state.service.list().await?))
}

async fn create_task<S: TaskService>(State(state): State<AppState<S>>, Json(payload): Json<CreateTask>) -> Result<Json<Task>, ApiError> {
    Ok(Json(state.service.create(payload).await?))
}

async fn get_task<S: TaskService>(State(state): State<AppState<S>>, Path(id): Path<String>) -> Result<Json<Task>, ApiError> {
    let id = parse_id(&id)?;
    Ok(Json(state.service.get(id).await?))
}

async fn toggle_task<S: TaskService>(State(state): State<AppState<S>>, Path(id): Path<String>) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;
    found_or_empty(state.service.toggle(id).await)
}

async fn update_task<S: TaskService>(State(state): State<AppState<S>>, Path(id): Path<String>, Json(payload): Json<TaskPatch>) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;
    found_or_empty(state.service.update(id, payload).await)
}

async fn delete_task<S: TaskService>(State(state): State<AppState<S>>, Path(id): Path<String>) -> Result<Json<DeleteResult>, ApiError> {
    let id = parse_id(&id)?;
    let affected = state.service.remove(id).await?;
    Ok(Json(DeleteResult { affected }))
}

/// Mutations on an unknown id answer 200 with an empty body rather than an error.
fn found_or_empty(result: Result<Task, ServiceError>) -> Result<Response, ApiError> {
    match result {
        Ok(task) => Ok(Json(task).into_response()),
        Err(ServiceError::NotFound(id)) => {
            tracing::debug!(%id, "mutation on unknown task");
            Ok(StatusCode::OK.into_response())
        }
        Err(e) => Err(e.into()),
    }
}

fn parse_id(s: &str) -> Result<TaskId, ApiError> { s.parse::<i64>().map(TaskId).map_err(|_| ApiError::bad_request("invalid id")) }
