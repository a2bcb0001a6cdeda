/*
 * Responsibility
 * - /auth request/response DTOs
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::rules::{char_len_between, is_email};
use crate::services::auth::Role;

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.name.trim().is_empty() {
            return Err("name is required");
        }
        if !char_len_between(self.name.trim(), 2, 50) {
            return Err("name must be between 2 and 50 characters");
        }
        if !is_email(self.email.trim()) {
            return Err("a valid email is required");
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err("password must be at least 6 characters");
        }
        Ok(())
    }

    /// Emails are stored and compared lowercased.
    pub fn normalized_email(&self) -> String {
        self.email.trim().to_lowercase()
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err("email and password are required");
        }
        Ok(())
    }

    pub fn normalized_email(&self) -> String {
        self.email.trim().to_lowercase()
    }
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

impl ChangePasswordRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.current_password.is_empty() {
            return Err("current_password is required");
        }
        if self.new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err("new_password must be at least 6 characters");
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub expires_in: i64,
    pub user: AuthUser,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub expires_in: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(name: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn register_rules() {
        assert!(register("Kim", "kim@example.com", "secret1").validate().is_ok());
        assert!(register("K", "kim@example.com", "secret1").validate().is_err());
        assert!(register("Kim", "kim-at-example.com", "secret1").validate().is_err());
        assert!(register("Kim", "kim@example.com", "12345").validate().is_err());
        assert!(register(&"n".repeat(51), "kim@example.com", "secret1").validate().is_err());
    }

    #[test]
    fn email_is_normalized() {
        assert_eq!(
            register("Kim", "  Kim@Example.COM ", "secret1").normalized_email(),
            "kim@example.com"
        );
    }

    #[test]
    fn missing_fields_deserialize_then_fail_validation() {
        let req: LoginRequest = serde_json::from_str(r#"{"email":"kim@example.com"}"#).unwrap();
        assert_eq!(req.validate(), Err("email and password are required"));
    }

    #[test]
    fn new_password_length_is_checked() {
        let req = ChangePasswordRequest {
            current_password: "old-secret".into(),
            new_password: "short".into(),
        };
        assert!(req.validate().is_err());
    }
}
