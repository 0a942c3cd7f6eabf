/*
 * Responsibility
 * - users テーブル向けの store trait と SQLx 実装
 * - 認証コアからは trait (外部コラボレータ) としてだけ見える
 * - DB エラーは RepoError に変換して返す
 */
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::repos::error::RepoError;

/// ユーザーの状態。0 = 無効 (ロック), 1 = 有効。
pub mod user_status {
    pub const DISABLED: i32 = 0;
    pub const ACTIVE: i32 = 1;
}

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    /// bcrypt ハッシュ。レスポンスには絶対に載せない。
    pub password: String,
    pub nickname: String,
    pub email: String,
    pub avatar: Option<String>,
    pub role: String,
    pub status: i32,
    pub last_login_at: Option<DateTime<Utc>>,
    pub last_login_ip: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub nickname: String,
    pub email: String,
    pub role: String,
    pub status: i32,
}

/// 認証コアが必要とするユーザーストアの契約。
/// 実体は Postgres だが、テストでは in-memory 実装を差し込む。
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRow>, RepoError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRow>, RepoError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<UserRow>, RepoError>;
    async fn insert(&self, user: NewUser) -> Result<UserRow, RepoError>;
    /// ログイン成功後の副作用。認証コアの契約の外なので失敗しても致命ではない。
    async fn update_last_login(&self, id: i64, ip: Option<&str>) -> Result<(), RepoError>;
}

const USER_COLUMNS: &str = r#"
    id, username, password, nickname, email, avatar, role, status,
    last_login_at, last_login_ip, created_at, updated_at
"#;

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRow>, RepoError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE username = $1
            "#
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRow>, RepoError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE email = $1
            "#
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<UserRow>, RepoError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn insert(&self, user: NewUser) -> Result<UserRow, RepoError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (username, password, nickname, email, role, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.username)
        .bind(&user.password)
        .bind(&user.nickname)
        .bind(&user.email)
        .bind(&user.role)
        .bind(user.status)
        .fetch_one(&self.pool)
        .await
        .map_err(RepoError::from_sqlx)?;

        Ok(row)
    }

    async fn update_last_login(&self, id: i64, ip: Option<&str>) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            UPDATE users
            SET last_login_at = now(), last_login_ip = $2
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(ip)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
