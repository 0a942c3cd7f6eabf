/*
 * Responsibility
 * - /article 系の request/response DTO
 * - query (list, top/featured) も DTO として受ける
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::repos::articles::{ArticleRow, article_status};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateArticleRequest {
    pub title: String,
    pub summary: Option<String>,
    pub content: String,
    /// 0 = draft (既定), 1 = 即時公開
    pub status: Option<i32>,
}

impl CreateArticleRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.title.trim().is_empty() {
            return Err("title is required");
        }
        if self.title.len() > 200 {
            return Err("title must be <= 200 chars");
        }
        if self.content.trim().is_empty() {
            return Err("content is required");
        }
        if let Some(summary) = &self.summary
            && summary.len() > 500
        {
            return Err("summary must be <= 500 chars");
        }
        if let Some(status) = self.status
            && status != article_status::DRAFT
            && status != article_status::PUBLISHED
        {
            return Err("status must be 0 (draft) or 1 (published)");
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateArticleRequest {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub content: Option<String>,
}

impl UpdateArticleRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err("title cannot be empty");
            }
            if title.len() > 200 {
                return Err("title must be <= 200 chars");
            }
        }
        if let Some(content) = &self.content
            && content.trim().is_empty()
        {
            return Err("content cannot be empty");
        }
        if let Some(summary) = &self.summary
            && summary.len() > 500
        {
            return Err("summary must be <= 500 chars");
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleListQuery {
    pub author_id: Option<i64>,
    /// 省略時は公開済みのみ
    pub status: Option<i32>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetTopQuery {
    /// 0 = 解除, 1 = 設定
    pub is_top: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetFeaturedQuery {
    pub is_featured: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleResponse {
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

impl From<ArticleRow> for ArticleResponse {
    fn from(row: ArticleRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            summary: row.summary,
            content: row.content,
            author_id: row.author_id,
            status: row.status,
            is_top: row.is_top,
            is_featured: row.is_featured,
            publish_time: row.publish_time,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
