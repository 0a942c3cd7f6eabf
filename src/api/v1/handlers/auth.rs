/*
 * Responsibility
 * - /auth/login, /auth/register handler
 * - ここは「明示的な認証の試行」なので、失敗はコード付きの業務エラーとして返す
 *   (passive な request filtering と違い、匿名に降格しない)
 */
use axum::{Json, extract::State, http::HeaderMap};
use tracing::{error, info, warn};

use crate::{
    api::v1::dto::auth::{LoginRequest, LoginResponse, RegisterRequest},
    error::{AppError, Envelope},
    repos::users::{NewUser, UserRow, user_status},
    services::auth::Role,
    state::AppState,
};

pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> Result<Json<Envelope<LoginResponse>>, AppError> {
    req.validate().map_err(AppError::param)?;

    let name = req.username.trim();

    // username で見つからなければ email として探す
    let user = match state.users.find_by_username(name).await? {
        Some(user) => Some(user),
        None => state.users.find_by_email(name).await?,
    }
    .ok_or(AppError::UserNotFound)?;

    // パスワード検証。壊れた保存ハッシュは不一致と同じ扱い
    if !bcrypt::verify(&req.password, &user.password).unwrap_or(false) {
        return Err(AppError::PasswordError);
    }

    if user.status != user_status::ACTIVE {
        return Err(AppError::AccountLocked);
    }

    // 最終ログインの記録は副作用。失敗してもログインは成立させる
    let ip = client_ip(&headers);
    if let Err(err) = state.users.update_last_login(user.id, ip.as_deref()).await {
        warn!(user_id = user.id, error = %err, "failed to record last login");
    }

    let response = issue_login_response(&state, user)?;
    info!(username = %response.username, "user logged in");

    Ok(Json(Envelope::success(response)))
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<Envelope<LoginResponse>>, AppError> {
    req.validate().map_err(AppError::param)?;

    let username = req.username.trim().to_string();
    let email = req.email.trim().to_string();

    if state.users.find_by_username(&username).await?.is_some() {
        return Err(AppError::AccountExists);
    }
    if state.users.find_by_email(&email).await?.is_some() {
        return Err(AppError::AccountExists);
    }

    let password = bcrypt::hash(&req.password, bcrypt::DEFAULT_COST).map_err(|e| {
        error!(error = %e, "failed to hash password");
        AppError::Internal
    })?;

    let nickname = req
        .nickname
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| username.clone());

    // 重複のレースは unique 制約 -> RepoError::Conflict -> 10002 に落ちる
    let user = state
        .users
        .insert(NewUser {
            username,
            password,
            nickname,
            email,
            role: Role::User.as_str().to_string(),
            status: user_status::ACTIVE,
        })
        .await?;

    info!(username = %user.username, "user registered");

    // 登録成功後はそのままログイン状態にする
    let response = issue_login_response(&state, user)?;
    Ok(Json(Envelope::success(response)))
}

fn issue_login_response(state: &AppState, user: UserRow) -> Result<LoginResponse, AppError> {
    let role: Role = user.role.parse().map_err(|_| {
        error!(user_id = user.id, role = %user.role, "stored role is not recognized");
        AppError::Internal
    })?;

    let token = state
        .tokens
        .issue(user.id, &user.username, role)
        .map_err(|_| AppError::Internal)?;

    Ok(LoginResponse {
        token,
        user_id: user.id,
        username: user.username,
        nickname: user.nickname,
        avatar: user.avatar,
        role,
    })
}

/// 多段 proxy を考慮して X-Forwarded-For の先頭、無ければ X-Real-IP を使う。
fn client_ip(headers: &HeaderMap) -> Option<String> {
    let from_header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("unknown"))
            .map(str::to_string)
    };

    from_header("x-forwarded-for").or_else(|| from_header("x-real-ip"))
}
