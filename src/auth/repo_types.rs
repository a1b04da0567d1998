use serde::{Deserialize, Serialize};
use time::Date;

/// Access level attached to every user and carried in tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "user" => Some(Role::User),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User record in the database.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Date,
    pub email_address: String,
    pub phone_number: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 hash, not exposed in JSON
    pub role: Role,
    pub is_active: bool,
}

/// Fields of a user about to be inserted; the id is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Date,
    pub email_address: String,
    pub phone_number: Option<String>,
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
}

/// Partial profile update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<Date>,
    pub email_address: Option<String>,
    pub phone_number: Option<String>,
}

impl UserChanges {
    pub fn apply(self, user: &mut User) {
        if let Some(v) = self.username {
            user.username = v;
        }
        if let Some(v) = self.first_name {
            user.first_name = v;
        }
        if let Some(v) = self.last_name {
            user.last_name = v;
        }
        if let Some(v) = self.date_of_birth {
            user.date_of_birth = v;
        }
        if let Some(v) = self.email_address {
            user.email_address = v;
        }
        if let Some(v) = self.phone_number {
            user.phone_number = Some(v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn role_round_trips_through_text() {
        assert_eq!(Role::parse("ADMIN"), Some(Role::Admin));
        assert_eq!(Role::parse(Role::User.as_str()), Some(Role::User));
        assert_eq!(Role::parse("root"), None);
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let user = User {
            id: 1,
            username: "alice01".into(),
            first_name: "Alice".into(),
            last_name: "Liddell".into(),
            date_of_birth: date!(1990 - 05 - 04),
            email_address: "alice@x.com".into(),
            phone_number: None,
            password_hash: "$argon2id$secret".into(),
            role: Role::User,
            is_active: true,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2"));
        assert!(json.contains("\"date_of_birth\":\"1990-05-04\""));
    }

    #[test]
    fn changes_only_touch_present_fields() {
        let mut user = User {
            id: 1,
            username: "alice01".into(),
            first_name: "Alice".into(),
            last_name: "Liddell".into(),
            date_of_birth: date!(1990 - 05 - 04),
            email_address: "alice@x.com".into(),
            phone_number: None,
            password_hash: String::new(),
            role: Role::User,
            is_active: true,
        };
        UserChanges {
            last_name: Some("Pleasance".into()),
            ..Default::default()
        }
        .apply(&mut user);
        assert_eq!(user.last_name, "Pleasance");
        assert_eq!(user.first_name, "Alice");
        assert_eq!(user.email_address, "alice@x.com");
    }
}
