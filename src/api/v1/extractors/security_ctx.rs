use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::services::auth::SecurityContext;
use crate::state::AppState;

/// Handler で SecurityContext を受け取るための extractor。
/// middleware が匿名でも必ず insert しているので、見つからないのは
/// ミドルウェア未設定のときだけ。その場合は認証なし扱いで拒否する。
pub struct SecurityCtx(pub SecurityContext);

impl FromRequestParts<AppState> for SecurityCtx
where
    AppState: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SecurityContext>()
            .cloned()
            .map(SecurityCtx)
            .ok_or(AppError::Unauthenticated {
                cause: "authentication middleware not applied".to_string(),
            })
    }
}
