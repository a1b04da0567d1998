use serde::Deserialize;
use time::Date;

use crate::{
    errors::AppError,
    todos::repo_types::{Priority, TodoChanges, TodoFilter},
    validation::check_len,
};

fn check_title(title: &str) -> Result<(), AppError> {
    check_len("title", title, 5, Some(30))
}

fn check_description(description: &str) -> Result<(), AppError> {
    check_len("description", description, 0, Some(50))
}

/// Request body for creating a task. The owner is never taken from the body.
#[derive(Debug, Clone, Deserialize)]
pub struct TodoCreateRequest {
    pub title: String,
    pub deadline: Date,
    #[serde(default)]
    pub description: Option<String>,
    pub priority: Priority,
    #[serde(default)]
    pub is_completed: bool,
}

impl TodoCreateRequest {
    pub fn validated(mut self) -> Result<Self, AppError> {
        self.title = self.title.trim().to_string();
        check_title(&self.title)?;
        if let Some(d) = &self.description {
            check_description(d)?;
        }
        Ok(self)
    }
}

/// Admin variant: the owner is explicit.
#[derive(Debug, Deserialize)]
pub struct AdminTodoCreateRequest {
    #[serde(flatten)]
    pub todo: TodoCreateRequest,
    pub user_id: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct TodoUpdateRequest {
    pub title: Option<String>,
    pub deadline: Option<Date>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub is_completed: Option<bool>,
}

impl TodoUpdateRequest {
    pub fn into_changes(self) -> Result<TodoChanges, AppError> {
        let title = self.title.map(|t| t.trim().to_string());
        if let Some(t) = &title {
            check_title(t)?;
        }
        if let Some(d) = &self.description {
            check_description(d)?;
        }
        Ok(TodoChanges {
            title,
            deadline: self.deadline,
            description: self.description,
            priority: self.priority,
            is_completed: self.is_completed,
        })
    }
}

/// Query string of the search endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct TodoSearchQuery {
    pub title: Option<String>,
    pub deadline: Option<Date>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub is_completed: Option<bool>,
}

impl TodoSearchQuery {
    pub fn into_filter(self, owner: Option<i64>) -> Result<TodoFilter, AppError> {
        if let Some(t) = &self.title {
            check_len("title", t, 0, Some(30))?;
        }
        if let Some(d) = &self.description {
            check_description(d)?;
        }
        if let Some(p) = &self.priority {
            check_len("priority", p, 0, Some(10))?;
        }
        Ok(TodoFilter {
            title: self.title,
            deadline: self.deadline,
            description: self.description,
            priority: self.priority,
            is_completed: self.is_completed,
            owner,
        })
    }
}
