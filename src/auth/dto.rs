use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    auth::repo_types::{Role, User, UserChanges},
    errors::AppError,
    validation::{check_email, check_len, check_phone, normalize_email, title_case},
};

/// Request body for self-service registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Date,
    pub email_address: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    pub password: String,
}

impl RegisterRequest {
    /// Trims and normalizes fields, then checks their bounds.
    pub fn validated(mut self) -> Result<Self, AppError> {
        self.username = self.username.trim().to_string();
        self.first_name = title_case(self.first_name.trim());
        self.last_name = title_case(self.last_name.trim());
        self.email_address = normalize_email(&self.email_address);
        self.phone_number = self.phone_number.map(|p| p.trim().to_string());

        check_len("username", &self.username, 6, Some(20))?;
        check_len("first_name", &self.first_name, 2, Some(20))?;
        check_len("last_name", &self.last_name, 2, Some(20))?;
        check_email(&self.email_address)?;
        if let Some(phone) = &self.phone_number {
            check_phone(phone)?;
        }
        check_len("password", &self.password, 6, None)?;
        Ok(self)
    }
}

/// Admin-issued registration: role and active flag are explicit.
#[derive(Debug, Deserialize)]
pub struct AdminRegisterRequest {
    #[serde(flatten)]
    pub user: RegisterRequest,
    #[serde(default)]
    pub role: Role,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Partial profile update; absent fields stay as they are.
#[derive(Debug, Default, Deserialize)]
pub struct UserUpdateRequest {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<Date>,
    pub email_address: Option<String>,
    pub phone_number: Option<String>,
}

impl UserUpdateRequest {
    pub fn into_changes(self) -> Result<UserChanges, AppError> {
        let changes = UserChanges {
            username: self.username.map(|v| v.trim().to_string()),
            first_name: self.first_name.map(|v| title_case(v.trim())),
            last_name: self.last_name.map(|v| title_case(v.trim())),
            date_of_birth: self.date_of_birth,
            email_address: self.email_address.map(|v| normalize_email(&v)),
            phone_number: self.phone_number.map(|v| v.trim().to_string()),
        };
        if let Some(v) = &changes.username {
            check_len("username", v, 6, Some(20))?;
        }
        if let Some(v) = &changes.first_name {
            check_len("first_name", v, 2, Some(20))?;
        }
        if let Some(v) = &changes.last_name {
            check_len("last_name", v, 2, Some(20))?;
        }
        if let Some(v) = &changes.email_address {
            check_email(v)?;
        }
        if let Some(v) = &changes.phone_number {
            check_phone(v)?;
        }
        Ok(changes)
    }
}

#[derive(Debug, Deserialize)]
pub struct PasswordUpdateRequest {
    pub old_password: String,
    pub new_password: String,
}

impl PasswordUpdateRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        check_len("old_password", &self.old_password, 6, None)?;
        check_len("new_password", &self.new_password, 6, None)
    }
}

/// OAuth2 password-flow form posted to `/auth/token`.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".into(),
        }
    }
}

/// User as returned to clients.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Date,
    pub email_address: String,
    pub phone_number: Option<String>,
    pub role: Role,
    pub is_active: bool,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            first_name: u.first_name,
            last_name: u.last_name,
            date_of_birth: u.date_of_birth,
            email_address: u.email_address,
            phone_number: u.phone_number,
            role: u.role,
            is_active: u.is_active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body() -> serde_json::Value {
        json!({
            "username": "alice01",
            "first_name": "alice",
            "last_name": "LIDDELL",
            "date_of_birth": "1990-05-04",
            "email_address": " Alice@X.com ",
            "password": "secret1"
        })
    }

    #[test]
    fn registration_is_normalized() {
        let req: RegisterRequest = serde_json::from_value(body()).unwrap();
        let req = req.validated().unwrap();
        assert_eq!(req.first_name, "Alice");
        assert_eq!(req.last_name, "Liddell");
        assert_eq!(req.email_address, "alice@x.com");
    }

    #[test]
    fn registration_bounds() {
        let mut b = body();
        b["username"] = json!("short");
        let req: RegisterRequest = serde_json::from_value(b).unwrap();
        assert!(matches!(req.validated(), Err(AppError::Validation(_))));

        let mut b = body();
        b["password"] = json!("12345");
        let req: RegisterRequest = serde_json::from_value(b).unwrap();
        assert!(matches!(req.validated(), Err(AppError::Validation(_))));

        let mut b = body();
        b["email_address"] = json!("not-an-email");
        let req: RegisterRequest = serde_json::from_value(b).unwrap();
        assert!(matches!(req.validated(), Err(AppError::Validation(_))));
    }

    #[test]
    fn admin_registration_defaults() {
        let req: AdminRegisterRequest = serde_json::from_value(body()).unwrap();
        assert_eq!(req.role, Role::User);
        assert!(req.is_active);

        let mut b = body();
        b["role"] = json!("admin");
        b["is_active"] = json!(false);
        let req: AdminRegisterRequest = serde_json::from_value(b).unwrap();
        assert_eq!(req.role, Role::Admin);
        assert!(!req.is_active);
    }

    #[test]
    fn update_keeps_absent_fields_unset() {
        let req: UserUpdateRequest =
            serde_json::from_value(json!({ "first_name": "bob" })).unwrap();
        let changes = req.into_changes().unwrap();
        assert_eq!(changes.first_name.as_deref(), Some("Bob"));
        assert!(changes.username.is_none());
        assert!(changes.email_address.is_none());
    }
}
