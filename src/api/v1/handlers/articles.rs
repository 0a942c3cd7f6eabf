/*
 * Responsibility
 * - /article 系 CRUD handler
 * - 変更系は「リソースを先に load → owner or admin チェック」の順を守る
 *   (存在しないものは 404 で返し、所有権エラーで存在を漏らさない)
 */
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use tracing::info;

use crate::{
    api::v1::dto::articles::{
        ArticleListQuery, ArticleResponse, CreateArticleRequest, SetFeaturedQuery, SetTopQuery,
        UpdateArticleRequest,
    },
    api::v1::extractors::SecurityCtx,
    error::{AppError, Envelope},
    repos::articles::{ArticleFilter, ArticleRow, NewArticle, article_status},
    services::auth::policy::check_owner_or_admin,
    state::AppState,
};

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

pub async fn create_article(
    State(state): State<AppState>,
    SecurityCtx(ctx): SecurityCtx,
    Json(req): Json<CreateArticleRequest>,
) -> Result<(StatusCode, Json<Envelope<ArticleResponse>>), AppError> {
    req.validate().map_err(AppError::param)?;

    let author_id = ctx.require_user_id()?;
    let status = req.status.unwrap_or(article_status::DRAFT);
    let publish_time = (status == article_status::PUBLISHED).then(Utc::now);

    let row = state
        .articles
        .insert(NewArticle {
            title: req.title,
            summary: req.summary,
            content: req.content,
            author_id,
            status,
            publish_time,
        })
        .await?;

    info!(article_id = row.id, author_id, "article created");

    Ok((
        StatusCode::CREATED,
        Json(Envelope::success(row.into())),
    ))
}

pub async fn get_article(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Envelope<ArticleResponse>>, AppError> {
    let row = load_article(&state, id).await?;
    Ok(Json(Envelope::success(row.into())))
}

pub async fn list_articles(
    State(state): State<AppState>,
    Query(query): Query<ArticleListQuery>,
) -> Result<Json<Envelope<Vec<ArticleResponse>>>, AppError> {
    let filter = ArticleFilter {
        author_id: query.author_id,
        // 公開一覧が既定。明示指定があればそれを使う
        status: query.status.or(Some(article_status::PUBLISHED)),
        limit: query
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE),
        offset: query.offset.unwrap_or(0).max(0),
    };

    let rows = state.articles.list(filter).await?;
    let res = rows.into_iter().map(ArticleResponse::from).collect();

    Ok(Json(Envelope::success(res)))
}

pub async fn update_article(
    State(state): State<AppState>,
    SecurityCtx(ctx): SecurityCtx,
    Path(id): Path<i64>,
    Json(req): Json<UpdateArticleRequest>,
) -> Result<Json<Envelope<ArticleResponse>>, AppError> {
    req.validate().map_err(AppError::param)?;

    let row = load_article(&state, id).await?;
    check_owner_or_admin(ctx.require_user_id()?, row.author_id, ctx.is_admin())?;

    let updated = state
        .articles
        .update(
            id,
            req.title.as_deref(),
            req.summary.as_deref(),
            req.content.as_deref(),
        )
        .await?
        .ok_or(AppError::not_found("article"))?;

    info!(article_id = id, "article updated");
    Ok(Json(Envelope::success(updated.into())))
}

pub async fn delete_article(
    State(state): State<AppState>,
    SecurityCtx(ctx): SecurityCtx,
    Path(id): Path<i64>,
) -> Result<Json<Envelope<()>>, AppError> {
    let row = load_article(&state, id).await?;
    check_owner_or_admin(ctx.require_user_id()?, row.author_id, ctx.is_admin())?;

    if !state.articles.delete(id).await? {
        return Err(AppError::not_found("article"));
    }

    info!(article_id = id, "article deleted");
    Ok(Json(Envelope::success(())))
}

pub async fn publish_draft(
    State(state): State<AppState>,
    SecurityCtx(ctx): SecurityCtx,
    Path(id): Path<i64>,
) -> Result<Json<Envelope<()>>, AppError> {
    let row = load_article(&state, id).await?;
    check_owner_or_admin(ctx.require_user_id()?, row.author_id, ctx.is_admin())?;

    if row.status == article_status::PUBLISHED {
        return Err(AppError::business("article is already published"));
    }

    // 初公開なら publish_time を今にする。再公開は元の時刻を残す
    let publish_time = Some(row.publish_time.unwrap_or_else(Utc::now));
    state
        .articles
        .set_status(id, article_status::PUBLISHED, publish_time)
        .await?;

    info!(article_id = id, "article published");
    Ok(Json(Envelope::success(())))
}

pub async fn offline_article(
    State(state): State<AppState>,
    SecurityCtx(ctx): SecurityCtx,
    Path(id): Path<i64>,
) -> Result<Json<Envelope<()>>, AppError> {
    let row = load_article(&state, id).await?;
    check_owner_or_admin(ctx.require_user_id()?, row.author_id, ctx.is_admin())?;

    if row.status != article_status::PUBLISHED {
        return Err(AppError::business("only published articles can be taken offline"));
    }

    state
        .articles
        .set_status(id, article_status::OFFLINE, None)
        .await?;

    info!(article_id = id, "article taken offline");
    Ok(Json(Envelope::success(())))
}

/// 管理者専用 (route policy が AdminOnly を保証する)
pub async fn set_top(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<SetTopQuery>,
) -> Result<Json<Envelope<()>>, AppError> {
    load_article(&state, id).await?;
    state.articles.set_top(id, query.is_top != 0).await?;

    info!(article_id = id, is_top = query.is_top, "article top flag set");
    Ok(Json(Envelope::success(())))
}

/// 管理者専用 (route policy が AdminOnly を保証する)
pub async fn set_featured(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<SetFeaturedQuery>,
) -> Result<Json<Envelope<()>>, AppError> {
    load_article(&state, id).await?;
    state
        .articles
        .set_featured(id, query.is_featured != 0)
        .await?;

    info!(
        article_id = id,
        is_featured = query.is_featured,
        "article featured flag set"
    );
    Ok(Json(Envelope::success(())))
}

async fn load_article(state: &AppState, id: i64) -> Result<ArticleRow, AppError> {
    state
        .articles
        .find_by_id(id)
        .await?
        .ok_or(AppError::not_found("article"))
}
