/*
 * Responsibility
 * - アプリ共通の AppError 定義と統一レスポンス envelope
 * - IntoResponse 実装 (HTTP status / {code, message, data, timestamp})
 * - 401/403 は境界でここに集約される (handler 側では結果型で伝播するだけ)
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Serialize;
use thiserror::Error;

use crate::repos::error::RepoError;
use crate::services::auth::policy::AuthzError;

/// API が返す業務コード。HTTP status とは独立した粒度を持つ。
pub mod code {
    pub const SUCCESS: &str = "20000";
    pub const ERROR: &str = "50000";

    pub const USER_NOT_EXIST: &str = "10001";
    pub const USER_ACCOUNT_EXIST: &str = "10002";
    pub const USER_PASSWORD_ERROR: &str = "10003";
    pub const USER_ACCOUNT_LOCKED: &str = "10004";

    pub const PARAM_ERROR: &str = "20001";

    pub const DATA_NOT_EXIST: &str = "30001";

    pub const UNAUTHORIZED: &str = "40001";
    pub const FORBIDDEN: &str = "40003";
}

/// 成功・失敗どちらも同じ形で返す envelope。
/// エラー時は data が null になる。
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub code: &'static str,
    pub message: String,
    pub data: Option<T>,
    pub timestamp: i64,
}

impl<T> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: code::SUCCESS,
            message: "success".to_string(),
            data: Some(data),
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    fn failure(code: &'static str, message: String) -> Self {
        Self {
            code,
            message,
            data: None,
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{message}")]
    BadRequest { code: &'static str, message: String },
    #[error("please log in first: {cause}")]
    Unauthenticated { cause: String },
    #[error("insufficient privileges: {cause}")]
    Forbidden { cause: String },
    #[error("user does not exist")]
    UserNotFound,
    #[error("account already exists")]
    AccountExists,
    #[error("password error")]
    PasswordError,
    #[error("account locked")]
    AccountLocked,
    #[error("{resource} not found")]
    NotFound { resource: &'static str },
    #[error("internal server error")]
    Internal,
}

impl AppError {
    /// DTO validation 失敗など、形式エラー (20001)
    pub fn param(message: impl Into<String>) -> Self {
        Self::BadRequest {
            code: code::PARAM_ERROR,
            message: message.into(),
        }
    }

    /// コード固有でない業務エラー (50000)
    pub fn business(message: impl Into<String>) -> Self {
        Self::BadRequest {
            code: code::ERROR,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &'static str) -> Self {
        Self::NotFound { resource }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::BadRequest { code, .. } => (StatusCode::BAD_REQUEST, *code),
            AppError::Unauthenticated { .. } => (StatusCode::UNAUTHORIZED, code::UNAUTHORIZED),
            AppError::Forbidden { .. } => (StatusCode::FORBIDDEN, code::FORBIDDEN),
            AppError::UserNotFound => (StatusCode::BAD_REQUEST, code::USER_NOT_EXIST),
            AppError::AccountExists => (StatusCode::CONFLICT, code::USER_ACCOUNT_EXIST),
            AppError::PasswordError => (StatusCode::BAD_REQUEST, code::USER_PASSWORD_ERROR),
            AppError::AccountLocked => (StatusCode::FORBIDDEN, code::USER_ACCOUNT_LOCKED),
            AppError::NotFound { .. } => (StatusCode::NOT_FOUND, code::DATA_NOT_EXIST),
            AppError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, code::ERROR),
        };

        let message = self.to_string();

        // 認証/認可の拒否と 5xx は境界で error ログに残す
        match &self {
            AppError::Unauthenticated { .. } | AppError::Forbidden { .. } | AppError::Internal => {
                tracing::error!(code, %message, "request rejected");
            }
            _ => {
                tracing::debug!(code, %message, "request failed");
            }
        }

        let body = Envelope::<()>::failure(code, message);
        (status, Json(body)).into_response()
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::Conflict => AppError::AccountExists,
            RepoError::Db(err) => {
                tracing::error!(error = %err, "store operation failed");
                AppError::Internal
            }
        }
    }
}

impl From<AuthzError> for AppError {
    fn from(e: AuthzError) -> Self {
        match e {
            AuthzError::Unauthenticated(cause) => AppError::Unauthenticated {
                cause: cause.to_string(),
            },
            AuthzError::Forbidden(cause) => AppError::Forbidden {
                cause: cause.to_string(),
            },
        }
    }
}
