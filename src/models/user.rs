use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

/// Stored user row. Holds the password hash, so it is never serialized;
/// responses go through [`UserProfile`].
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
    pub address: Option<Json<Address>>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            address: user.address.map(|a| a.0),
            phone: user.phone,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

const MIN_NAME_LENGTH: usize = 2;
const MAX_NAME_LENGTH: usize = 100;
const MAX_EMAIL_LENGTH: usize = 255;
const MIN_PASSWORD_LENGTH: usize = 6;

impl RegisterRequest {
    pub fn validate(&self) -> Result<()> {
        let name_length = self.name.trim().chars().count();
        if name_length < MIN_NAME_LENGTH {
            return Err(AppError::BadRequest(
                "Name must be at least 2 characters".to_string(),
            ));
        }
        if name_length > MAX_NAME_LENGTH {
            return Err(AppError::BadRequest(
                "Name must not exceed 100 characters".to_string(),
            ));
        }

        let email = normalize_email(&self.email);
        if email.chars().count() > MAX_EMAIL_LENGTH {
            return Err(AppError::BadRequest(
                "Email must not exceed 255 characters".to_string(),
            ));
        }
        if !is_valid_email(&email) {
            return Err(AppError::BadRequest("Invalid email address".to_string()));
        }

        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AppError::BadRequest(
                "Password must be at least 6 characters".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub token: String,
}

impl AuthResponse {
    pub fn new(user: User, token: String) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            token,
        }
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// `local@domain.tld` with no whitespace anywhere.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.contains('@') {
        return false;
    }

    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("jane@x.com"));
        assert!(is_valid_email("a.b+c@mail.example.org"));
        assert!(!is_valid_email("jane@x"));
        assert!(!is_valid_email("jane x@x.com"));
        assert!(!is_valid_email("@x.com"));
        assert!(!is_valid_email("jane@.com"));
        assert!(!is_valid_email("jane@@x.com"));
        assert!(!is_valid_email("jane.x.com"));
    }

    #[test]
    fn registration_rules() {
        assert!(request("Jane", "jane@x.com", "secret1").validate().is_ok());
        assert!(request("Jane", "  JANE@X.COM ", "secret1").validate().is_ok());
        assert!(request("J", "jane@x.com", "secret1").validate().is_err());
        assert!(request("Jane", "jane", "secret1").validate().is_err());
        assert!(request("Jane", "jane@x.com", "12345").validate().is_err());
    }

    #[test]
    fn oversized_names_and_emails_are_rejected() {
        let long_name = "n".repeat(150);
        assert!(matches!(
            request(&long_name, "jane@x.com", "secret1").validate(),
            Err(AppError::BadRequest(msg)) if msg == "Name must not exceed 100 characters"
        ));
        assert!(request(&"n".repeat(100), "jane@x.com", "secret1").validate().is_ok());

        let long_email = format!("{}@x.com", "a".repeat(250));
        assert!(matches!(
            request("Jane", &long_email, "secret1").validate(),
            Err(AppError::BadRequest(msg)) if msg == "Email must not exceed 255 characters"
        ));
    }

    #[test]
    fn emails_are_normalized() {
        assert_eq!(normalize_email("  Jane@X.com "), "jane@x.com");
    }

    #[test]
    fn profile_never_carries_the_password() {
        let user = User {
            id: 7,
            name: "Jane".into(),
            email: "jane@x.com".into(),
            password: "$2b$12$hash".into(),
            role: UserRole::User,
            address: None,
            phone: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let body = serde_json::to_value(UserProfile::from(user)).unwrap();
        assert!(body.get("password").is_none());
        assert_eq!(body["role"], "user");
        assert_eq!(body["id"], 7);
    }
}
