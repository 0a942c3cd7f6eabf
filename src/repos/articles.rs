/*
 * Responsibility
 * - articles テーブル向けの store trait と SQLx 実装
 * - 所有権チェックは上位 (handler + policy) の責務。ここは CRUD のみ
 */
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::repos::error::RepoError;

/// 記事の状態遷移: draft -> published -> offline (offline からの再公開も可)
pub mod article_status {
    pub const DRAFT: i32 = 0;
    pub const PUBLISHED: i32 = 1;
    pub const OFFLINE: i32 = 2;
}

#[derive(Debug, Clone, FromRow)]
pub struct ArticleRow {
    pub id: i64,
    pub title: String,
    pub summary: Option<String>,
    pub content: String,
    pub author_id: i64,
    pub status: i32,
    pub is_top: bool,
    pub is_featured: bool,
    pub publish_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewArticle {
    pub title: String,
    pub summary: Option<String>,
    pub content: String,
    pub author_id: i64,
    pub status: i32,
    pub publish_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct ArticleFilter {
    pub author_id: Option<i64>,
    pub status: Option<i32>,
    pub limit: i64,
    pub offset: i64,
}

#[async_trait]
pub trait ArticleStore: Send + Sync {
    async fn insert(&self, article: NewArticle) -> Result<ArticleRow, RepoError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<ArticleRow>, RepoError>;
    async fn list(&self, filter: ArticleFilter) -> Result<Vec<ArticleRow>, RepoError>;
    async fn update(
        &self,
        id: i64,
        title: Option<&str>,
        summary: Option<&str>,
        content: Option<&str>,
    ) -> Result<Option<ArticleRow>, RepoError>;
    async fn delete(&self, id: i64) -> Result<bool, RepoError>;
    /// publish_time は Some のときだけ上書きする
    async fn set_status(
        &self,
        id: i64,
        status: i32,
        publish_time: Option<DateTime<Utc>>,
    ) -> Result<bool, RepoError>;
    async fn set_top(&self, id: i64, is_top: bool) -> Result<bool, RepoError>;
    async fn set_featured(&self, id: i64, is_featured: bool) -> Result<bool, RepoError>;
}

const ARTICLE_COLUMNS: &str = r#"
    id, title, summary, content, author_id, status, is_top, is_featured,
    publish_time, created_at, updated_at
"#;

pub struct PgArticleStore {
    pool: PgPool,
}

impl PgArticleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ArticleStore for PgArticleStore {
    async fn insert(&self, article: NewArticle) -> Result<ArticleRow, RepoError> {
        let row = sqlx::query_as::<_, ArticleRow>(&format!(
            r#"
            INSERT INTO articles (title, summary, content, author_id, status, publish_time)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {ARTICLE_COLUMNS}
            "#
        ))
        .bind(&article.title)
        .bind(&article.summary)
        .bind(&article.content)
        .bind(article.author_id)
        .bind(article.status)
        .bind(article.publish_time)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<ArticleRow>, RepoError> {
        let row = sqlx::query_as::<_, ArticleRow>(&format!(
            r#"
            SELECT {ARTICLE_COLUMNS}
            FROM articles
            WHERE id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn list(&self, filter: ArticleFilter) -> Result<Vec<ArticleRow>, RepoError> {
        // is_top を優先、その後は新着順
        let rows = sqlx::query_as::<_, ArticleRow>(&format!(
            r#"
            SELECT {ARTICLE_COLUMNS}
            FROM articles
            WHERE ($1::bigint IS NULL OR author_id = $1)
              AND ($2::int IS NULL OR status = $2)
            ORDER BY is_top DESC, created_at DESC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(filter.author_id)
        .bind(filter.status)
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn update(
        &self,
        id: i64,
        title: Option<&str>,
        summary: Option<&str>,
        content: Option<&str>,
    ) -> Result<Option<ArticleRow>, RepoError> {
        let row = sqlx::query_as::<_, ArticleRow>(&format!(
            r#"
            UPDATE articles
            SET
                title = COALESCE($2, title),
                summary = COALESCE($3, summary),
                content = COALESCE($4, content),
                updated_at = now()
            WHERE id = $1
            RETURNING {ARTICLE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(title)
        .bind(summary)
        .bind(content)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn delete(&self, id: i64) -> Result<bool, RepoError> {
        let result = sqlx::query(
            r#"
            DELETE FROM articles
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_status(
        &self,
        id: i64,
        status: i32,
        publish_time: Option<DateTime<Utc>>,
    ) -> Result<bool, RepoError> {
        let result = sqlx::query(
            r#"
            UPDATE articles
            SET
                status = $2,
                publish_time = COALESCE($3, publish_time),
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(publish_time)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_top(&self, id: i64, is_top: bool) -> Result<bool, RepoError> {
        let result = sqlx::query(
            r#"
            UPDATE articles
            SET is_top = $2, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(is_top)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_featured(&self, id: i64, is_featured: bool) -> Result<bool, RepoError> {
        let result = sqlx::query(
            r#"
            UPDATE articles
            SET is_featured = $2, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(is_featured)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
