use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Form, Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{
            LoginForm, PasswordUpdateRequest, RegisterRequest, TokenResponse, UserResponse,
            UserUpdateRequest,
        },
        extractors::AuthUser,
        services,
    },
    errors::AppError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/user_registration", post(register))
        .route("/auth/token", post(login))
        .route("/auth/:user_id", get(get_user).put(update_user))
        .route("/auth/:user_id/password_updating", put(update_password))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let user = services::register(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, form), fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Json<TokenResponse>, AppError> {
    let token = services::login(&state, &form.username, &form.password).await?;
    Ok(Json(TokenResponse::bearer(token)))
}

#[instrument(skip(state, principal))]
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(user_id): Path<i64>,
) -> Result<Json<UserResponse>, AppError> {
    let user = services::get_by_id(&state, &principal, user_id).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, principal, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(user_id): Path<i64>,
    Json(payload): Json<UserUpdateRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let user = services::update_profile(&state, &principal, user_id, payload).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, principal, payload))]
pub async fn update_password(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(user_id): Path<i64>,
    Json(payload): Json<PasswordUpdateRequest>,
) -> Result<StatusCode, AppError> {
    payload.validate()?;
    services::change_password(
        &state,
        &principal,
        user_id,
        &payload.old_password,
        &payload.new_password,
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}
