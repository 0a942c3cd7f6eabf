/*
 * Responsibility
 * - Bearer トークンの抽出 → 検証 → SecurityContext の設定 (authenticate)
 * - 認証は best-effort でリクエストを落とさない。拒否するのは route policy 側
 * - route policy の適用 (enforce_route_policy)。401/403 は AppError 経由で envelope になる
 */
//! 二段構えの認証・認可:
//!
//! 1. `authenticate` はトークンがあれば principal を解決して SecurityContext に
//!    入れるだけ。トークン不正・期限切れ・ユーザー消失はすべて匿名として通す。
//! 2. `enforce_route_policy` が route table を見て、保護されたルートだけを
//!    ここで初めて拒否する。public ルートと保護ルートが同じ filter を共有できる。

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::error::AppError;
use crate::services::auth::SecurityContext;
use crate::services::auth::policy;
use crate::services::auth::principal::ResolveError;
use crate::state::AppState;

const BEARER_PREFIX: &str = "Bearer ";

/// Router 全体 (nest 済み) に認証・認可を掛ける。
///
/// axum は後から layer したものが外側になるため、ここの順序で
/// authenticate → enforce_route_policy → handler の順に通る。
pub fn apply(router: Router, state: AppState) -> Router {
    router
        .layer(middleware::from_fn_with_state(
            state.clone(),
            enforce_route_policy,
        ))
        .layer(middleware::from_fn_with_state(state, authenticate))
}

/// `Authorization` ヘッダから Bearer トークンを取り出す。
/// prefix 不一致・空トークンは「トークンなし」と同じ扱い。
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix(BEARER_PREFIX)
        .filter(|t| !t.is_empty())
}

/// Best-effort の認証。どんな入力でもリクエストは必ず先へ進める。
async fn authenticate(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let mut ctx = SecurityContext::anonymous();

    if let Some(token) = bearer_token(req.headers())
        && state.tokens.validate(token)
    {
        // validate 直後なので parse は通る前提だが、失敗しても匿名で継続する
        match state.tokens.parse(token) {
            Ok(claims) => match state.resolver.resolve_by_username(&claims.username).await {
                Ok(principal) => {
                    tracing::debug!(
                        user_id = principal.user_id,
                        authority = principal.authority(),
                        "request authenticated"
                    );
                    ctx = SecurityContext::authenticated(principal);
                }
                // トークンは本物だがアカウントが消えた/無効化された。想定内なので匿名へ
                Err(err @ (ResolveError::NotFound | ResolveError::Disabled)) => {
                    tracing::warn!(
                        username = %claims.username,
                        error = %err,
                        "token subject is no longer usable, continuing as anonymous"
                    );
                }
                // store 障害など想定外。リクエストは匿名で通すが error で残す
                Err(err) => {
                    tracing::error!(
                        username = %claims.username,
                        error = %err,
                        "principal resolution failed, continuing as anonymous"
                    );
                }
            },
            Err(err) => {
                tracing::warn!(error = %err, "token became unparseable after validation");
            }
        }
    }

    // 匿名でも必ず SecurityContext を入れる。downstream は存在を前提にできる
    req.extensions_mut().insert(ctx);
    next.run(req).await
}

/// Route policy を適用する。authenticate の後段で動く前提。
async fn enforce_route_policy(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let ctx = req
        .extensions()
        .get::<SecurityContext>()
        .cloned()
        .unwrap_or_default();

    let access = state.route_policy.required(req.method(), req.uri().path());
    policy::authorize(access, &ctx)?;

    Ok(next.run(req).await)
}
