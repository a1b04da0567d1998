use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use time::Date;
use tracing::{info, warn};

use super::{StoreError, TodoStore, UserStore};
use crate::auth::repo_types::{NewUser, Role, User, UserChanges};
use crate::todos::repo_types::{NewTodo, Priority, Todo, TodoChanges, TodoFilter};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) {
        match sqlx::migrate!("./migrations").run(&self.pool).await {
            Ok(()) => info!("migrations applied"),
            Err(e) => {
                warn!(error = %e, "migrations folder not found or migration failed; continuing")
            }
        }
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    username: String,
    first_name: String,
    last_name: String,
    date_of_birth: Date,
    email_address: String,
    phone_number: Option<String>,
    password_hash: String,
    role: String,
    is_active: bool,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        let role = Role::parse(&r.role).ok_or_else(|| {
            StoreError::Database(sqlx::Error::Decode(
                format!("unknown role {:?} for user {}", r.role, r.id).into(),
            ))
        })?;
        Ok(User {
            id: r.id,
            username: r.username,
            first_name: r.first_name,
            last_name: r.last_name,
            date_of_birth: r.date_of_birth,
            email_address: r.email_address,
            phone_number: r.phone_number,
            password_hash: r.password_hash,
            role,
            is_active: r.is_active,
        })
    }
}

#[derive(Debug, FromRow)]
struct TodoRow {
    id: i64,
    title: String,
    deadline: Date,
    description: Option<String>,
    priority: String,
    is_completed: bool,
    user_id: i64,
}

impl TryFrom<TodoRow> for Todo {
    type Error = StoreError;

    fn try_from(r: TodoRow) -> Result<Self, Self::Error> {
        let priority = Priority::parse(&r.priority).ok_or_else(|| {
            StoreError::Database(sqlx::Error::Decode(
                format!("unknown priority {:?} for todo {}", r.priority, r.id).into(),
            ))
        })?;
        Ok(Todo {
            id: r.id,
            title: r.title,
            deadline: r.deadline,
            description: r.description,
            priority,
            is_completed: r.is_completed,
            user_id: r.user_id,
        })
    }
}

/// Constraint violations become typed errors so services can answer 409/404.
fn classify(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return StoreError::Conflict;
        }
        if db.is_foreign_key_violation() {
            return StoreError::MissingOwner;
        }
    }
    StoreError::Database(e)
}

/// `%needle%` with LIKE metacharacters escaped.
fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn collect<R, T>(rows: Vec<R>) -> Result<Vec<T>, StoreError>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, new: NewUser) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (username, first_name, last_name, date_of_birth,
                               email_address, phone_number, password_hash, role, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, username, first_name, last_name, date_of_birth,
                      email_address, phone_number, password_hash, role, is_active
            "#,
        )
        .bind(&new.username)
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(new.date_of_birth)
        .bind(&new.email_address)
        .bind(&new.phone_number)
        .bind(&new.password_hash)
        .bind(new.role.as_str())
        .bind(new.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)?;
        row.try_into()
    }

    async fn user_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, first_name, last_name, date_of_birth,
                   email_address, phone_number, password_hash, role, is_active
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(User::try_from).transpose()
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, first_name, last_name, date_of_birth,
                   email_address, phone_number, password_hash, role, is_active
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        row.map(User::try_from).transpose()
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, first_name, last_name, date_of_birth,
                   email_address, phone_number, password_hash, role, is_active
            FROM users
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        collect(rows)
    }

    async fn update_user(
        &self,
        id: i64,
        changes: UserChanges,
    ) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
               SET username      = COALESCE($2, username),
                   first_name    = COALESCE($3, first_name),
                   last_name     = COALESCE($4, last_name),
                   date_of_birth = COALESCE($5, date_of_birth),
                   email_address = COALESCE($6, email_address),
                   phone_number  = COALESCE($7, phone_number)
             WHERE id = $1
            RETURNING id, username, first_name, last_name, date_of_birth,
                      email_address, phone_number, password_hash, role, is_active
            "#,
        )
        .bind(id)
        .bind(changes.username)
        .bind(changes.first_name)
        .bind(changes.last_name)
        .bind(changes.date_of_birth)
        .bind(changes.email_address)
        .bind(changes.phone_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)?;
        row.map(User::try_from).transpose()
    }

    async fn set_password_hash(&self, id: i64, password_hash: &str) -> Result<bool, StoreError> {
        let res = sqlx::query(r#"UPDATE users SET password_hash = $2 WHERE id = $1"#)
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() == 1)
    }

    async fn delete_user(&self, id: i64) -> Result<bool, StoreError> {
        // todos.user_id is ON DELETE CASCADE
        let res = sqlx::query(r#"DELETE FROM users WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() == 1)
    }
}

#[async_trait]
impl TodoStore for PgStore {
    async fn insert_todo(&self, new: NewTodo) -> Result<Todo, StoreError> {
        let row = sqlx::query_as::<_, TodoRow>(
            r#"
            INSERT INTO todos (title, deadline, description, priority, is_completed, user_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, title, deadline, description, priority, is_completed, user_id
            "#,
        )
        .bind(&new.title)
        .bind(new.deadline)
        .bind(&new.description)
        .bind(new.priority.as_str())
        .bind(new.is_completed)
        .bind(new.user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)?;
        row.try_into()
    }

    async fn todo_by_id(&self, id: i64) -> Result<Option<Todo>, StoreError> {
        let row = sqlx::query_as::<_, TodoRow>(
            r#"
            SELECT id, title, deadline, description, priority, is_completed, user_id
            FROM todos
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Todo::try_from).transpose()
    }

    async fn todos_by_user(&self, user_id: i64) -> Result<Vec<Todo>, StoreError> {
        let rows = sqlx::query_as::<_, TodoRow>(
            r#"
            SELECT id, title, deadline, description, priority, is_completed, user_id
            FROM todos
            WHERE user_id = $1
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        collect(rows)
    }

    async fn list_todos(&self) -> Result<Vec<Todo>, StoreError> {
        let rows = sqlx::query_as::<_, TodoRow>(
            r#"
            SELECT id, title, deadline, description, priority, is_completed, user_id
            FROM todos
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        collect(rows)
    }

    async fn search_todos(&self, filter: &TodoFilter) -> Result<Vec<Todo>, StoreError> {
        let rows = sqlx::query_as::<_, TodoRow>(
            r#"
            SELECT id, title, deadline, description, priority, is_completed, user_id
            FROM todos
            WHERE ($1::text   IS NULL OR title ILIKE $1)
              AND ($2::date   IS NULL OR deadline = $2)
              AND ($3::text   IS NULL OR description ILIKE $3)
              AND ($4::text   IS NULL OR priority ILIKE $4)
              AND ($5::bool   IS NULL OR is_completed = $5)
              AND ($6::bigint IS NULL OR user_id = $6)
            ORDER BY id
            "#,
        )
        .bind(filter.title.as_deref().map(like_pattern))
        .bind(filter.deadline)
        .bind(filter.description.as_deref().map(like_pattern))
        .bind(filter.priority.as_deref().map(like_pattern))
        .bind(filter.is_completed)
        .bind(filter.owner)
        .fetch_all(&self.pool)
        .await?;
        collect(rows)
    }

    async fn update_todo(
        &self,
        id: i64,
        changes: TodoChanges,
    ) -> Result<Option<Todo>, StoreError> {
        let row = sqlx::query_as::<_, TodoRow>(
            r#"
            UPDATE todos
               SET title        = COALESCE($2, title),
                   deadline     = COALESCE($3, deadline),
                   description  = COALESCE($4, description),
                   priority     = COALESCE($5, priority),
                   is_completed = COALESCE($6, is_completed)
             WHERE id = $1
            RETURNING id, title, deadline, description, priority, is_completed, user_id
            "#,
        )
        .bind(id)
        .bind(changes.title)
        .bind(changes.deadline)
        .bind(changes.description)
        .bind(changes.priority.map(|p| p.as_str()))
        .bind(changes.is_completed)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)?;
        row.map(Todo::try_from).transpose()
    }

    async fn delete_todo(&self, id: i64) -> Result<bool, StoreError> {
        let res = sqlx::query(r#"DELETE FROM todos WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() == 1)
    }
}
