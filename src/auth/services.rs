use tracing::{info, warn};

use crate::{
    auth::{
        claims::Principal,
        dto::{RegisterRequest, UserUpdateRequest},
        guard::{authorize, Policy},
        password::{hash_password, verify_dummy, verify_password},
        repo_types::{NewUser, Role, User},
    },
    errors::{AppError, Resource},
    state::AppState,
};

/// Hashes the password and inserts the user. `role`/`is_active` are only
/// caller-controlled on the admin path.
pub async fn create_user(
    st: &AppState,
    req: RegisterRequest,
    role: Role,
    is_active: bool,
) -> Result<User, AppError> {
    let req = req.validated()?;
    let password_hash = hash_password(&req.password)?;
    let user = st
        .users
        .insert_user(NewUser {
            username: req.username,
            first_name: req.first_name,
            last_name: req.last_name,
            date_of_birth: req.date_of_birth,
            email_address: req.email_address,
            phone_number: req.phone_number,
            password_hash,
            role,
            is_active,
        })
        .await
        .map_err(|e| {
            warn!(error = %e, "user insert rejected");
            AppError::from(e)
        })?;
    info!(user_id = user.id, username = %user.username, %role, "user registered");
    Ok(user)
}

/// Self-service registration: always a regular, active user.
pub async fn register(st: &AppState, req: RegisterRequest) -> Result<User, AppError> {
    create_user(st, req, Role::User, true).await
}

pub async fn get_by_id(st: &AppState, _principal: &Principal, id: i64) -> Result<User, AppError> {
    st.users
        .user_by_id(id)
        .await?
        .ok_or(AppError::NotFound(Resource::User))
}

pub async fn update_profile(
    st: &AppState,
    principal: &Principal,
    id: i64,
    req: UserUpdateRequest,
) -> Result<User, AppError> {
    authorize(principal, Policy::RequireOwnerOrAdmin(id))?;
    let changes = req.into_changes()?;
    let user = st
        .users
        .update_user(id, changes)
        .await?
        .ok_or(AppError::NotFound(Resource::User))?;
    info!(user_id = id, by = principal.user_id, "user updated");
    Ok(user)
}

pub async fn change_password(
    st: &AppState,
    principal: &Principal,
    id: i64,
    old_password: &str,
    new_password: &str,
) -> Result<(), AppError> {
    authorize(principal, Policy::RequireOwnerOrAdmin(id))?;
    let user = st
        .users
        .user_by_id(id)
        .await?
        .ok_or(AppError::NotFound(Resource::User))?;

    if !verify_password(old_password, &user.password_hash)? {
        warn!(user_id = id, "password change with wrong old password");
        return Err(AppError::Unauthenticated);
    }

    let hash = hash_password(new_password)?;
    if !st.users.set_password_hash(id, &hash).await? {
        return Err(AppError::NotFound(Resource::User));
    }
    info!(user_id = id, "password changed");
    Ok(())
}

pub async fn delete_by_id(st: &AppState, principal: &Principal, id: i64) -> Result<(), AppError> {
    authorize(principal, Policy::RequireAdmin)?;
    if !st.users.delete_user(id).await? {
        return Err(AppError::NotFound(Resource::User));
    }
    info!(user_id = id, by = principal.user_id, "user deleted");
    Ok(())
}

/// `None` for an unknown username and for a wrong password alike.
pub async fn authenticate(
    st: &AppState,
    username: &str,
    password: &str,
) -> Result<Option<User>, AppError> {
    let Some(user) = st.users.user_by_username(username).await? else {
        verify_dummy(password);
        return Ok(None);
    };
    if !verify_password(password, &user.password_hash)? {
        return Ok(None);
    }
    Ok(Some(user))
}

/// Authenticates and issues an access token with the configured lifetime.
pub async fn login(st: &AppState, username: &str, password: &str) -> Result<String, AppError> {
    let user = authenticate(st, username, password).await?.ok_or_else(|| {
        warn!("login failed");
        AppError::Unauthenticated
    })?;
    let token = st.keys.issue_default(&user.username, user.id, user.role)?;
    info!(user_id = user.id, "user logged in");
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn register_request(username: &str, email: &str) -> RegisterRequest {
        serde_json::from_value(json!({
            "username": username,
            "first_name": "Test",
            "last_name": "User",
            "date_of_birth": "1990-01-01",
            "email_address": email,
            "password": "password1"
        }))
        .unwrap()
    }

    fn principal(user: &User) -> Principal {
        Principal {
            user_id: user.id,
            username: user.username.clone(),
            role: user.role,
        }
    }

    #[tokio::test]
    async fn register_defaults_and_hashes() {
        let st = AppState::fake();
        let user = register(&st, register_request("alice01", "alice@x.com")).await.unwrap();
        assert_eq!(user.role, Role::User);
        assert!(user.is_active);
        assert_ne!(user.password_hash, "password1");
        assert!(verify_password("password1", &user.password_hash).unwrap());
    }

    #[tokio::test]
    async fn register_duplicate_is_conflict_and_writes_nothing() {
        let st = AppState::fake();
        register(&st, register_request("alice01", "alice@x.com")).await.unwrap();

        let err = register(&st, register_request("alice01", "new@x.com")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict));
        let err = register(&st, register_request("alice02", "ALICE@x.com")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict));
        assert_eq!(st.users.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let st = AppState::fake();
        register(&st, register_request("alice01", "alice@x.com")).await.unwrap();

        let wrong_password = login(&st, "alice01", "password2").await.unwrap_err();
        let unknown_user = login(&st, "nobody01", "password1").await.unwrap_err();
        assert!(matches!(wrong_password, AppError::Unauthenticated));
        assert!(matches!(unknown_user, AppError::Unauthenticated));
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());

        assert!(authenticate(&st, "nobody01", "password1").await.unwrap().is_none());
        assert!(authenticate(&st, "alice01", "password2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn login_token_carries_identity() {
        let st = AppState::fake();
        let user = register(&st, register_request("alice01", "alice@x.com")).await.unwrap();
        let token = login(&st, "alice01", "password1").await.unwrap();
        let p = st.keys.validate(&token).unwrap();
        assert_eq!(p, principal(&user));
    }

    #[tokio::test]
    async fn update_profile_requires_self_or_admin() {
        let st = AppState::fake();
        let alice = register(&st, register_request("alice01", "alice@x.com")).await.unwrap();
        let bob = register(&st, register_request("bobby01", "bob@x.com")).await.unwrap();

        let err = update_profile(
            &st,
            &principal(&bob),
            alice.id,
            UserUpdateRequest {
                first_name: Some("mallory".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Forbidden));

        let updated = update_profile(
            &st,
            &principal(&alice),
            alice.id,
            UserUpdateRequest {
                first_name: Some("alicia".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.first_name, "Alicia");
        assert_eq!(updated.email_address, "alice@x.com");
    }

    #[tokio::test]
    async fn update_profile_conflict_and_not_found() {
        let st = AppState::fake();
        let alice = register(&st, register_request("alice01", "alice@x.com")).await.unwrap();
        register(&st, register_request("bobby01", "bob@x.com")).await.unwrap();

        let err = update_profile(
            &st,
            &principal(&alice),
            alice.id,
            UserUpdateRequest {
                email_address: Some("bob@x.com".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Conflict));

        let mut admin = principal(&alice);
        admin.role = Role::Admin;
        let err = update_profile(&st, &admin, 999, UserUpdateRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(Resource::User)));
    }

    #[tokio::test]
    async fn change_password_requires_old_password() {
        let st = AppState::fake();
        let alice = register(&st, register_request("alice01", "alice@x.com")).await.unwrap();
        let p = principal(&alice);

        let err = change_password(&st, &p, alice.id, "wrong-old", "newpass1")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated));

        change_password(&st, &p, alice.id, "password1", "newpass1").await.unwrap();
        assert!(login(&st, "alice01", "password1").await.is_err());
        assert!(login(&st, "alice01", "newpass1").await.is_ok());
    }

    #[tokio::test]
    async fn delete_is_admin_only() {
        let st = AppState::fake();
        let alice = register(&st, register_request("alice01", "alice@x.com")).await.unwrap();
        let err = delete_by_id(&st, &principal(&alice), alice.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden));

        let mut admin = principal(&alice);
        admin.role = Role::Admin;
        delete_by_id(&st, &admin, alice.id).await.unwrap();
        let err = delete_by_id(&st, &admin, alice.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(Resource::User)));
    }

    #[tokio::test]
    async fn get_by_id_reports_missing_user() {
        let st = AppState::fake();
        let alice = register(&st, register_request("alice01", "alice@x.com")).await.unwrap();
        let p = principal(&alice);
        assert_eq!(get_by_id(&st, &p, alice.id).await.unwrap().username, "alice01");
        assert!(matches!(
            get_by_id(&st, &p, alice.id + 1).await,
            Err(AppError::NotFound(Resource::User))
        ));
    }
}
