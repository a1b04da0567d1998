//! Admin surface. Every operation starts with `RequireAdmin` and then reuses
//! the user/todo services.

use crate::{
    auth::{
        claims::Principal,
        dto::{AdminRegisterRequest, UserUpdateRequest},
        guard::{authorize, Policy},
        repo_types::User,
        services as users,
    },
    errors::AppError,
    state::AppState,
    todos::{
        dto::{AdminTodoCreateRequest, TodoSearchQuery, TodoUpdateRequest},
        repo_types::Todo,
        services as todos,
    },
};

fn require_admin(principal: &Principal) -> Result<(), AppError> {
    authorize(principal, Policy::RequireAdmin)
}

pub async fn list_users(st: &AppState, principal: &Principal) -> Result<Vec<User>, AppError> {
    require_admin(principal)?;
    Ok(st.users.list_users().await?)
}

pub async fn get_user(st: &AppState, principal: &Principal, id: i64) -> Result<User, AppError> {
    require_admin(principal)?;
    users::get_by_id(st, principal, id).await
}

pub async fn register_user(
    st: &AppState,
    principal: &Principal,
    req: AdminRegisterRequest,
) -> Result<User, AppError> {
    require_admin(principal)?;
    users::create_user(st, req.user, req.role, req.is_active).await
}

pub async fn update_user(
    st: &AppState,
    principal: &Principal,
    id: i64,
    req: UserUpdateRequest,
) -> Result<User, AppError> {
    require_admin(principal)?;
    users::update_profile(st, principal, id, req).await
}

pub async fn delete_user(st: &AppState, principal: &Principal, id: i64) -> Result<(), AppError> {
    require_admin(principal)?;
    users::delete_by_id(st, principal, id).await
}

pub async fn list_todos(st: &AppState, principal: &Principal) -> Result<Vec<Todo>, AppError> {
    require_admin(principal)?;
    Ok(st.todos.list_todos().await?)
}

/// Unscoped search over every user's tasks.
pub async fn search_todos(
    st: &AppState,
    principal: &Principal,
    query: TodoSearchQuery,
) -> Result<Vec<Todo>, AppError> {
    require_admin(principal)?;
    todos::search(st, query.into_filter(None)?).await
}

/// Creates a task on behalf of an arbitrary, existing user.
pub async fn create_todo(
    st: &AppState,
    principal: &Principal,
    req: AdminTodoCreateRequest,
) -> Result<Todo, AppError> {
    require_admin(principal)?;
    todos::insert(st, req.todo, req.user_id).await
}

pub async fn update_todo(
    st: &AppState,
    principal: &Principal,
    id: i64,
    req: TodoUpdateRequest,
) -> Result<Todo, AppError> {
    require_admin(principal)?;
    todos::update_by_id(st, principal, req, id).await
}

pub async fn delete_todo(st: &AppState, principal: &Principal, id: i64) -> Result<(), AppError> {
    require_admin(principal)?;
    todos::delete_by_id(st, principal, id).await
}
