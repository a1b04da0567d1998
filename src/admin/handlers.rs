use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::instrument;

use super::services;
use crate::{
    auth::{
        dto::{AdminRegisterRequest, UserResponse, UserUpdateRequest},
        extractors::AuthUser,
    },
    errors::AppError,
    state::AppState,
    todos::{
        dto::{AdminTodoCreateRequest, TodoSearchQuery, TodoUpdateRequest},
        repo_types::Todo,
    },
};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(list_users))
        .route(
            "/admin/users/:user_id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/admin/user_registration", post(register_user))
        .route("/admin/todos", get(list_todos).post(create_todo))
        .route("/admin/todos/search", get(search_todos))
        .route("/admin/todos/:todo_id", put(update_todo).delete(delete_todo))
}

#[instrument(skip(state, principal))]
pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = services::list_users(&state, &principal).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[instrument(skip(state, principal))]
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(user_id): Path<i64>,
) -> Result<Json<UserResponse>, AppError> {
    Ok(Json(services::get_user(&state, &principal, user_id).await?.into()))
}

#[instrument(skip(state, principal, payload))]
pub async fn register_user(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Json(payload): Json<AdminRegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let user = services::register_user(&state, &principal, payload).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, principal, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(user_id): Path<i64>,
    Json(payload): Json<UserUpdateRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let user = services::update_user(&state, &principal, user_id, payload).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, principal))]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(user_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    services::delete_user(&state, &principal, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, principal))]
pub async fn list_todos(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> Result<Json<Vec<Todo>>, AppError> {
    Ok(Json(services::list_todos(&state, &principal).await?))
}

#[instrument(skip(state, principal))]
pub async fn search_todos(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Query(query): Query<TodoSearchQuery>,
) -> Result<Json<Vec<Todo>>, AppError> {
    Ok(Json(services::search_todos(&state, &principal, query).await?))
}

#[instrument(skip(state, principal, payload))]
pub async fn create_todo(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Json(payload): Json<AdminTodoCreateRequest>,
) -> Result<(StatusCode, Json<Todo>), AppError> {
    let todo = services::create_todo(&state, &principal, payload).await?;
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
        services::update_todo(&state, &principal, todo_id, payload).await?,
    ))
}

#[instrument(skip(state, principal))]
pub async fn delete_todo(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(todo_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    services::delete_todo(&state, &principal, todo_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
