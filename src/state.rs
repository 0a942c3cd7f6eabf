/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - user/article store, TokenService, PrincipalResolver, RoutePolicy
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::config::Config;
use crate::repos::{articles::ArticleStore, users::UserStore};
use crate::services::auth::{
    PrincipalResolver, TokenService, factory::build_token_service, policy::RoutePolicy,
};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub articles: Arc<dyn ArticleStore>,
    pub tokens: Arc<TokenService>,
    pub resolver: Arc<PrincipalResolver>,
    pub route_policy: Arc<RoutePolicy>,
}

impl AppState {
    pub fn new(users: Arc<dyn UserStore>, articles: Arc<dyn ArticleStore>, config: &Config) -> Self {
        let tokens = build_token_service(config);
        let resolver = Arc::new(PrincipalResolver::new(users.clone()));

        Self {
            users,
            articles,
            tokens,
            resolver,
            route_policy: Arc::new(RoutePolicy::blog_defaults()),
        }
    }
}
