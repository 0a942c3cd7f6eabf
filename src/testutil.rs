/*
 * Responsibility
 * - テスト専用の in-memory store と router 組み立てヘルパ
 * - 本番コードは trait (UserStore/ArticleStore) 越しにしか store を見ないので、
 *   ここで差し替えるだけで DB なしの end-to-end テストができる
 */
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use axum::Router;
use axum::response::Response;
use chrono::{DateTime, Utc};

use crate::app;
use crate::config::{AppEnv, Config};
use crate::repos::articles::{ArticleFilter, ArticleRow, ArticleStore, NewArticle};
use crate::repos::error::RepoError;
use crate::repos::users::{NewUser, UserRow, UserStore};
use crate::services::auth::token::Claims;
use crate::services::auth::{Role, TokenService};
use crate::state::AppState;

/// テストは速度優先で最小コスト
const BCRYPT_TEST_COST: u32 = 4;

pub struct MemoryUserStore {
    users: Mutex<Vec<UserRow>>,
    next_id: AtomicI64,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// 生のハッシュ値で直接 seed する低レベル版
    pub fn seed(
        &self,
        username: &str,
        password_hash: &str,
        email: &str,
        role: &str,
        status: i32,
    ) -> i64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        self.users.lock().unwrap().push(UserRow {
            id,
            username: username.to_string(),
            password: password_hash.to_string(),
            nickname: username.to_string(),
            email: email.to_string(),
            avatar: None,
            role: role.to_string(),
            status,
            last_login_at: None,
            last_login_ip: None,
            created_at: now,
            updated_at: now,
        });
        id
    }

    pub fn get(&self, id: i64) -> Option<UserRow> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned()
    }

    pub fn get_by_username(&self, username: &str) -> Option<UserRow> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.username == username)
            .cloned()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRow>, RepoError> {
        Ok(self.get_by_username(username))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRow>, RepoError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<UserRow>, RepoError> {
        Ok(self.get(id))
    }

    async fn insert(&self, user: NewUser) -> Result<UserRow, RepoError> {
        let mut users = self.users.lock().unwrap();
        // unique 制約の代わり
        if users
            .iter()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(RepoError::Conflict);
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        let row = UserRow {
            id,
            username: user.username,
            password: user.password,
            nickname: user.nickname,
            email: user.email,
            avatar: None,
            role: user.role,
            status: user.status,
            last_login_at: None,
            last_login_ip: None,
            created_at: now,
            updated_at: now,
        };
        users.push(row.clone());
        Ok(row)
    }

    async fn update_last_login(&self, id: i64, ip: Option<&str>) -> Result<(), RepoError> {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter_mut().find(|u| u.id == id) {
            user.last_login_at = Some(Utc::now());
            user.last_login_ip = ip.map(str::to_string);
        }
        Ok(())
    }
}

/// store 障害をシミュレートする。全メソッドがエラーを返す。
pub struct FailingUserStore;

#[async_trait]
impl UserStore for FailingUserStore {
    async fn find_by_username(&self, _username: &str) -> Result<Option<UserRow>, RepoError> {
        Err(RepoError::Db(sqlx::Error::PoolClosed))
    }

    async fn find_by_email(&self, _email: &str) -> Result<Option<UserRow>, RepoError> {
        Err(RepoError::Db(sqlx::Error::PoolClosed))
    }

    async fn find_by_id(&self, _id: i64) -> Result<Option<UserRow>, RepoError> {
        Err(RepoError::Db(sqlx::Error::PoolClosed))
    }

    async fn insert(&self, _user: NewUser) -> Result<UserRow, RepoError> {
        Err(RepoError::Db(sqlx::Error::PoolClosed))
    }

    async fn update_last_login(&self, _id: i64, _ip: Option<&str>) -> Result<(), RepoError> {
        Err(RepoError::Db(sqlx::Error::PoolClosed))
    }
}

pub struct MemoryArticleStore {
    articles: Mutex<Vec<ArticleRow>>,
    next_id: AtomicI64,
}

impl MemoryArticleStore {
    pub fn new() -> Self {
        Self {
            articles: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }

    pub fn get(&self, id: i64) -> Option<ArticleRow> {
        self.articles
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == id)
            .cloned()
    }

    pub fn seed(&self, author_id: i64, title: &str, status: i32) -> i64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        self.articles.lock().unwrap().push(ArticleRow {
            id,
            title: title.to_string(),
            summary: None,
            content: "content".to_string(),
            author_id,
            status,
            is_top: false,
            is_featured: false,
            publish_time: (status == crate::repos::articles::article_status::PUBLISHED)
                .then(|| now),
            created_at: now,
            updated_at: now,
        });
        id
    }
}

#[async_trait]
impl ArticleStore for MemoryArticleStore {
    async fn insert(&self, article: NewArticle) -> Result<ArticleRow, RepoError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        let row = ArticleRow {
            id,
            title: article.title,
            summary: article.summary,
            content: article.content,
            author_id: article.author_id,
            status: article.status,
            is_top: false,
            is_featured: false,
            publish_time: article.publish_time,
            created_at: now,
            updated_at: now,
        };
        self.articles.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<ArticleRow>, RepoError> {
        Ok(self.get(id))
    }

    async fn list(&self, filter: ArticleFilter) -> Result<Vec<ArticleRow>, RepoError> {
        let mut rows: Vec<ArticleRow> = self
            .articles
            .lock()
            .unwrap()
            .iter()
            .filter(|a| filter.author_id.is_none_or(|id| a.author_id == id))
            .filter(|a| filter.status.is_none_or(|s| a.status == s))
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.is_top
                .cmp(&a.is_top)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(rows
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .collect())
    }

    async fn update(
        &self,
        id: i64,
        title: Option<&str>,
        summary: Option<&str>,
        content: Option<&str>,
    ) -> Result<Option<ArticleRow>, RepoError> {
        let mut articles = self.articles.lock().unwrap();
        let Some(row) = articles.iter_mut().find(|a| a.id == id) else {
            return Ok(None);
        };
        if let Some(title) = title {
            row.title = title.to_string();
        }
        if let Some(summary) = summary {
            row.summary = Some(summary.to_string());
        }
        if let Some(content) = content {
            row.content = content.to_string();
        }
        row.updated_at = Utc::now();
        Ok(Some(row.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool, RepoError> {
        let mut articles = self.articles.lock().unwrap();
        let before = articles.len();
        articles.retain(|a| a.id != id);
        Ok(articles.len() < before)
    }

    async fn set_status(
        &self,
        id: i64,
        status: i32,
        publish_time: Option<DateTime<Utc>>,
    ) -> Result<bool, RepoError> {
        let mut articles = self.articles.lock().unwrap();
        let Some(row) = articles.iter_mut().find(|a| a.id == id) else {
            return Ok(false);
        };
        row.status = status;
        if publish_time.is_some() {
            row.publish_time = publish_time;
        }
        row.updated_at = Utc::now();
        Ok(true)
    }

    async fn set_top(&self, id: i64, is_top: bool) -> Result<bool, RepoError> {
        let mut articles = self.articles.lock().unwrap();
        let Some(row) = articles.iter_mut().find(|a| a.id == id) else {
            return Ok(false);
        };
        row.is_top = is_top;
        Ok(true)
    }

    async fn set_featured(&self, id: i64, is_featured: bool) -> Result<bool, RepoError> {
        let mut articles = self.articles.lock().unwrap();
        let Some(row) = articles.iter_mut().find(|a| a.id == id) else {
            return Ok(false);
        };
        row.is_featured = is_featured;
        Ok(true)
    }
}

fn test_config() -> Config {
    Config {
        addr: "127.0.0.1:0".parse().expect("test addr"),
        database_url: String::new(),
        app_env: AppEnv::Development,
        cors_allowed_origins: Vec::new(),
        jwt_secret: "integration-test-secret-key-0123456789".to_string(),
        jwt_expiration_millis: 604_800_000,
    }
}

/// in-memory store で組んだアプリ一式。
pub struct TestApp {
    state: AppState,
    users: Arc<MemoryUserStore>,
    articles: Arc<MemoryArticleStore>,
}

impl TestApp {
    pub fn new() -> Self {
        let users = Arc::new(MemoryUserStore::new());
        let articles = Arc::new(MemoryArticleStore::new());
        let state = AppState::new(users.clone(), articles.clone(), &test_config());
        Self {
            state,
            users,
            articles,
        }
    }

    /// user store が常に落ちる構成 (匿名降格の検証用)
    pub fn with_failing_user_store() -> Self {
        let users = Arc::new(MemoryUserStore::new());
        let articles = Arc::new(MemoryArticleStore::new());
        let state = AppState::new(
            Arc::new(FailingUserStore),
            articles.clone(),
            &test_config(),
        );
        Self {
            state,
            users,
            articles,
        }
    }

    pub fn router(&self) -> Router {
        app::build_router(self.state.clone())
    }

    pub fn tokens(&self) -> &TokenService {
        &self.state.tokens
    }

    /// 平文パスワードを bcrypt して seed する。email は `{username}@example.com`
    pub fn seed_user(&self, username: &str, password: &str, role: Role, status: i32) -> i64 {
        let hash = bcrypt::hash(password, BCRYPT_TEST_COST).expect("bcrypt hash");
        self.users.seed(
            username,
            &hash,
            &format!("{username}@example.com"),
            role.as_str(),
            status,
        )
    }

    pub fn seed_article(&self, author_id: i64, title: &str, status: i32) -> i64 {
        self.articles.seed(author_id, title, status)
    }

    pub fn user_by_id(&self, id: i64) -> Option<UserRow> {
        self.users.get(id)
    }

    pub fn article_by_id(&self, id: i64) -> Option<ArticleRow> {
        self.articles.get(id)
    }

    /// seed 済みユーザーの有効なトークンを発行する (status は見ない)
    pub fn token_for(&self, username: &str) -> String {
        let user = self
            .users
            .get_by_username(username)
            .expect("user must be seeded first");
        let role: Role = user.role.parse().expect("seeded role must parse");
        self.state
            .tokens
            .issue(user.id, &user.username, role)
            .expect("token issue")
    }

    /// 任意の claims でトークンを作る (実在しないユーザーの検証用)
    pub fn token_for_claims(&self, user_id: i64, username: &str, role: Role) -> String {
        self.state
            .tokens
            .issue(user_id, username, role)
            .expect("token issue")
    }

    /// 期限切れトークン (署名は正しい)
    pub fn expired_token_for(&self, username: &str) -> String {
        let user = self
            .users
            .get_by_username(username)
            .expect("user must be seeded first");
        let role: Role = user.role.parse().expect("seeded role must parse");
        let now = Utc::now().timestamp();
        self.state
            .tokens
            .sign(&Claims {
                user_id: user.id,
                username: user.username,
                role,
                iat: now - 7200,
                exp: now - 3600,
            })
            .expect("token sign")
    }
}

/// Response body を JSON として読む
pub async fn body_json(res: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(res.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("body is json")
}
