use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::store::StoreError;

pub const MESSAGE_401: &str = "Could not validate user";
pub const MESSAGE_403: &str = "Access denied";
pub const MESSAGE_409: &str = "Duplicate values are not accepted";
pub const MESSAGE_500: &str = "Internal server error";

/// The kind of record a lookup missed, used for the 404 message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    User,
    Todo,
}

impl Resource {
    pub fn not_found_message(self) -> &'static str {
        match self {
            Resource::User => "User(s) not found",
            Resource::Todo => "Todo(s) not found",
        }
    }
}

/// Every failure a request can end in. Each variant maps to exactly one
/// status code and a fixed message.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{}", MESSAGE_401)]
    Unauthenticated,
    #[error("{}", MESSAGE_403)]
    Forbidden,
    #[error("{}", .0.not_found_message())]
    NotFound(Resource),
    #[error("{}", MESSAGE_409)]
    Conflict,
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict => StatusCode::CONFLICT,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Maps a store failure. Missing foreign keys surface as the owner not
    /// being found.
    pub fn from_store(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => AppError::Conflict,
            StoreError::MissingOwner => AppError::NotFound(Resource::User),
            StoreError::Database(e) => AppError::Internal(anyhow::Error::new(e)),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::from_store(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            AppError::Internal(e) => {
                error!(error = %e, "internal error");
                MESSAGE_500.to_string()
            }
            other => other.to_string(),
        };
        let body = Json(json!({ "detail": detail }));

        if status == StatusCode::UNAUTHORIZED {
            (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}
