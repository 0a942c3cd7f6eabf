/*
 * Responsibility
 * - /auth 系の request/response DTO
 * - validation (形式チェック) は validate() に寄せる。業務チェックは handler/service 側
 */
use serde::{Deserialize, Serialize};

use crate::services::auth::Role;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// username または email
    pub username: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.username.trim().is_empty() {
            return Err("username is required");
        }
        if self.password.is_empty() {
            return Err("password is required");
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: String,
    pub nickname: Option<String>,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        let username = self.username.trim();
        if username.is_empty() {
            return Err("username is required");
        }
        if username.len() > 50 {
            return Err("username must be <= 50 chars");
        }
        if self.password.len() < 6 {
            return Err("password must be >= 6 chars");
        }
        if self.password.len() > 72 {
            // bcrypt only hashes the first 72 bytes
            return Err("password must be <= 72 chars");
        }
        if !self.email.contains('@') {
            return Err("email is invalid");
        }
        if let Some(nickname) = &self.nickname
            && nickname.len() > 50
        {
            return Err("nickname must be <= 50 chars");
        }
        Ok(())
    }
}

/// login / register 共通のレスポンス。token はこの形でしか露出しない。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user_id: i64,
    pub username: String,
    pub nickname: String,
    pub avatar: Option<String>,
    pub role: Role,
}
