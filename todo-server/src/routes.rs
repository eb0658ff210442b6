use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;
use todo_core::{Confirmation, Database, NewTask, ReorderRequest, SortMode, Task, TaskPatch};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
}

pub fn router(db: Database) -> Router {
    Router::new()
        .route("/api/todos", get(list_todos).post(create_todo))
        .route("/api/todos/reorder", post(reorder_todos))
        .route(
            "/api/todos/{id}",
            get(get_todo).put(update_todo).delete(delete_todo),
        )
        .with_state(AppState { db })
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn list_todos(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<Task>>, ApiError> {
    // An unreadable query string sorts like an unknown sortBy value.
    let sort = match params {
        Ok(Query(params)) => params
            .sort_by
            .as_deref()
            .map(SortMode::from_param)
            .unwrap_or_default(),
        Err(rejection) => {
            tracing::debug!(error = %rejection.body_text(), "ignoring list query");
            SortMode::Default
        }
    };

    Ok(Json(state.db.list_tasks(sort).await?))
}

async fn get_todo(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Task>, ApiError> {
    let Path(id) = id?;

    Ok(Json(state.db.get_task(id).await?))
}

async fn create_todo(
    State(state): State<AppState>,
    payload: Result<Json<NewTask>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let Json(new_task) = payload?;
    let task = state.db.create_task(new_task).await?;

    tracing::info!(id = task.id, "todo created");
    Ok((StatusCode::CREATED, Json(task)))
}

async fn update_todo(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<TaskPatch>, JsonRejection>,
) -> Result<Json<Task>, ApiError> {
    let Path(id) = id?;
    let Json(patch) = payload?;

    Ok(Json(state.db.update_task(id, patch).await?))
}

async fn reorder_todos(
    State(state): State<AppState>,
    payload: Result<Json<ReorderRequest>, JsonRejection>,
) -> Result<Json<Confirmation>, ApiError> {
    let Json(request) =
        payload.map_err(|_| ApiError::BadRequest("Todos array is required".to_string()))?;
    state.db.reorder_tasks(&request.ids()).await?;

    Ok(Json(Confirmation::new("Todos reordered successfully")))
}

async fn delete_todo(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Confirmation>, ApiError> {
    let Path(id) = id?;
    state.db.delete_task(id).await?;

    tracing::info!(id, "todo deleted");
    Ok(Json(Confirmation::new("Todo deleted successfully")))
}
