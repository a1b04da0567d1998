use tracing::{info, warn};

use crate::{
    auth::{
        claims::Principal,
        guard::{authorize, authorize_loaded, Policy},
    },
    errors::{AppError, Resource},
    state::AppState,
    todos::{
        dto::{TodoCreateRequest, TodoSearchQuery, TodoUpdateRequest},
        repo_types::{NewTodo, Todo, TodoFilter},
    },
};

/// Tasks owned by `user_id`; an empty list is reported as not found.
pub async fn list_by_user(
    st: &AppState,
    principal: &Principal,
    user_id: i64,
) -> Result<Vec<Todo>, AppError> {
    authorize(principal, Policy::RequireOwnerOrAdmin(user_id))?;
    let todos = st.todos.todos_by_user(user_id).await?;
    if todos.is_empty() {
        return Err(AppError::NotFound(Resource::Todo));
    }
    Ok(todos)
}

pub async fn list_own(st: &AppState, principal: &Principal) -> Result<Vec<Todo>, AppError> {
    list_by_user(st, principal, principal.user_id).await
}

/// Loads a task and checks the caller may touch it.
async fn load_authorized(st: &AppState, principal: &Principal, id: i64) -> Result<Todo, AppError> {
    let todo = st.todos.todo_by_id(id).await?;
    authorize_loaded(principal, todo.as_ref().map(|t| t.user_id), Resource::Todo)?;
    todo.ok_or(AppError::NotFound(Resource::Todo))
}

pub async fn get_by_id(st: &AppState, principal: &Principal, id: i64) -> Result<Todo, AppError> {
    load_authorized(st, principal, id).await
}

/// Inserts a task owned by `owner`. Shared by the user and admin paths.
pub async fn insert(
    st: &AppState,
    req: TodoCreateRequest,
    owner: i64,
) -> Result<Todo, AppError> {
    let req = req.validated()?;
    let todo = st
        .todos
        .insert_todo(NewTodo {
            title: req.title,
            deadline: req.deadline,
            description: req.description,
            priority: req.priority,
            is_completed: req.is_completed,
            user_id: owner,
        })
        .await
        .map_err(|e| {
            warn!(error = %e, owner, "todo insert rejected");
            AppError::from(e)
        })?;
    info!(todo_id = todo.id, owner, "todo created");
    Ok(todo)
}

/// The caller always becomes the owner.
pub async fn create(
    st: &AppState,
    principal: &Principal,
    req: TodoCreateRequest,
) -> Result<Todo, AppError> {
    insert(st, req, principal.user_id).await
}

pub async fn delete_by_id(st: &AppState, principal: &Principal, id: i64) -> Result<(), AppError> {
    load_authorized(st, principal, id).await?;
    if !st.todos.delete_todo(id).await? {
        return Err(AppError::NotFound(Resource::Todo));
    }
    info!(todo_id = id, by = principal.user_id, "todo deleted");
    Ok(())
}

pub async fn update_by_id(
    st: &AppState,
    principal: &Principal,
    req: TodoUpdateRequest,
    id: i64,
) -> Result<Todo, AppError> {
    load_authorized(st, principal, id).await?;
    let changes = req.into_changes()?;
    let todo = st
        .todos
        .update_todo(id, changes)
        .await?
        .ok_or(AppError::NotFound(Resource::Todo))?;
    info!(todo_id = id, by = principal.user_id, "todo updated");
    Ok(todo)
}

/// Runs a search; an empty result is reported as not found.
pub async fn search(st: &AppState, filter: TodoFilter) -> Result<Vec<Todo>, AppError> {
    let todos = st.todos.search_todos(&filter).await?;
    if todos.is_empty() {
        return Err(AppError::NotFound(Resource::Todo));
    }
    Ok(todos)
}

/// Search limited to the caller's own tasks.
pub async fn search_own(
    st: &AppState,
    principal: &Principal,
    query: TodoSearchQuery,
) -> Result<Vec<Todo>, AppError> {
    search(st, query.into_filter(Some(principal.user_id))?).await
}
