/*
 * Responsibility
 * - Users request/response DTOs
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::rules::{char_len_between, is_empty_or_http_url};
use crate::repos::user_repo::{UserRow, UserStats};
use crate::services::auth::Role;

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    // None: leave unchanged
    pub name: Option<String>,
    // Some(""): clear the avatar
    pub avatar: Option<String>,
}

impl UpdateUserRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if let Some(name) = &self.name
            && !char_len_between(name.trim(), 2, 50)
        {
            return Err("name must be between 2 and 50 characters");
        }
        if let Some(avatar) = &self.avatar
            && (avatar.len() > 2048 || !is_empty_or_http_url(avatar))
        {
            return Err("avatar must be an http(s) URL or empty");
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub avatar: String,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRow> for UserResponse {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            role: row.role,
            avatar: row.avatar,
            last_login: row.last_login,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserStatsResponse {
    pub total_users: i64,
    pub new_users_this_month: i64,
    pub admin_users: i64,
    pub regular_users: i64,
}

impl From<UserStats> for UserStatsResponse {
    fn from(s: UserStats) -> Self {
        Self {
            total_users: s.total_users,
            new_users_this_month: s.new_users_this_month,
            admin_users: s.admin_users,
            regular_users: s.regular_users,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_updates_validate_only_present_fields() {
        let req: UpdateUserRequest = serde_json::from_str("{}").unwrap();
        assert!(req.validate().is_ok());

        let req: UpdateUserRequest = serde_json::from_str(r#"{"avatar": ""}"#).unwrap();
        assert!(req.validate().is_ok());

        let req: UpdateUserRequest = serde_json::from_str(r#"{"name": " "}"#).unwrap();
        assert!(req.validate().is_err());

        let req: UpdateUserRequest = serde_json::from_str(r#"{"avatar": "ftp://x/y.png"}"#).unwrap();
        assert!(req.validate().is_err());
    }
}
