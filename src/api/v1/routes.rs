/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - /health, /auth, /article を route
 * - 認証・認可はここではなく router root の middleware (route policy) が決める
 */
use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

use crate::api::v1::handlers::{
    articles::{
        create_article, delete_article, get_article, list_articles, offline_article,
        publish_draft, set_featured, set_top, update_article,
    },
    auth::{login, register},
    health::health,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/article", post(create_article))
        .route("/article/list", get(list_articles))
        .route(
            "/article/{id}",
            get(get_article).put(update_article).delete(delete_article),
        )
        .route("/article/{id}/publish", put(publish_draft))
        .route("/article/{id}/offline", put(offline_article))
        .route("/article/{id}/top", put(set_top))
        .route("/article/{id}/featured", put(set_featured))
}
