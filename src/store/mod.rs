//! Persistence seam. Services only see the [`UserStore`] and [`TodoStore`]
//! traits; `PgStore` backs them with Postgres and `MemoryStore` keeps
//! everything in process for development and tests.

use async_trait::async_trait;

use crate::auth::repo_types::{NewUser, User, UserChanges};
use crate::todos::repo_types::{NewTodo, Todo, TodoChanges, TodoFilter};

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint (username, email, or title+deadline) was violated.
    #[error("unique constraint violated")]
    Conflict,
    /// A task referenced a user that does not exist.
    #[error("owning user does not exist")]
    MissingOwner,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert_user(&self, new: NewUser) -> Result<User, StoreError>;
    async fn user_by_id(&self, id: i64) -> Result<Option<User>, StoreError>;
    async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;
    /// Returns `None` when no user has this id.
    async fn update_user(&self, id: i64, changes: UserChanges)
        -> Result<Option<User>, StoreError>;
    /// Returns `false` when no user has this id.
    async fn set_password_hash(&self, id: i64, password_hash: &str) -> Result<bool, StoreError>;
    /// Deletes the user and every task they own.
    async fn delete_user(&self, id: i64) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait TodoStore: Send + Sync {
    async fn insert_todo(&self, new: NewTodo) -> Result<Todo, StoreError>;
    async fn todo_by_id(&self, id: i64) -> Result<Option<Todo>, StoreError>;
    async fn todos_by_user(&self, user_id: i64) -> Result<Vec<Todo>, StoreError>;
    async fn list_todos(&self) -> Result<Vec<Todo>, StoreError>;
    async fn search_todos(&self, filter: &TodoFilter) -> Result<Vec<Todo>, StoreError>;
    async fn update_todo(&self, id: i64, changes: TodoChanges)
        -> Result<Option<Todo>, StoreError>;
    async fn delete_todo(&self, id: i64) -> Result<bool, StoreError>;
}
