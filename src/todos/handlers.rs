use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{TodoCreateRequest, TodoSearchQuery, TodoUpdateRequest},
    repo_types::Todo,
    services,
};
use crate::{auth::extractors::AuthUser, errors::AppError, state::AppState};

pub fn todo_routes() -> Router<AppState> {
    Router::new()
        .route("/todos", get(list_todos).post(create_todo))
        .route("/todos/search", get(search_todos))
        .route("/todos/user/:user_id", get(list_user_todos))
        .route(
            "/todos/:todo_id",
            get(get_todo).put(update_todo).delete(delete_todo),
        )
}

#[instrument(skip(state, principal))]
pub async fn list_todos(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> Result<Json<Vec<Todo>>, AppError> {
    Ok(Json(services::list_own(&state, &principal).await?))
}

#[instrument(skip(state, principal))]
pub async fn list_user_todos(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<Todo>>, AppError> {
    Ok(Json(services::list_by_user(&state, &principal, user_id).await?))
}

#[instrument(skip(state, principal))]
pub async fn search_todos(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Query(query): Query<TodoSearchQuery>,
) -> Result<Json<Vec<Todo>>, AppError> {
    Ok(Json(services::search_own(&state, &principal, query).await?))
}

#[instrument(skip(state, principal))]
pub async fn get_todo(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(todo_id): Path<i64>,
) -> Result<Json<Todo>, AppError> {
    Ok(Json(services::get_by_id(&state, &principal, todo_id).await?))
}

#[instrument(skip(state, principal, payload))]
pub async fn create_todo(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Json(payload): Json<TodoCreateRequest>,
) -> Result<(StatusCode, Json<Todo>), AppError> {
    let todo = services::create(&state, &principal, payload).await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

#[instrument(skip(state, principal, payload))]
pub async fn update_todo(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(todo_id): Path<i64>,
    Json(payload): Json<TodoUpdateRequest>,
) -> Result<Json<Todo>, AppError> {
    Ok(Json(
        services::update_by_id(&state, &principal, payload, todo_id).await?,
    ))
}

#[instrument(skip(state, principal))]
pub async fn delete_todo(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(todo_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    services::delete_by_id(&state, &principal, todo_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
