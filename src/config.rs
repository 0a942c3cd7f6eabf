/*
 * Responsibility
 * - 環境変数や設定の読み込み (DATABASE_URL, CORS 許可、JWT 設定など)
 * - 設定値のバリデーション (不足なら起動失敗)
 * - production で JWT_SECRET が未設定/既定値のままなら起動を拒否する
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

/// 開発用のフォールバック秘密鍵。production では使用禁止。
pub const DEV_FALLBACK_SECRET: &str = "blog-secret-key-for-jwt-token-generation-2024";

/// Token 有効期間の既定値（ミリ秒、7 日）
pub const DEFAULT_EXPIRATION_MILLIS: i64 = 604_800_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        match std::env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,

    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    pub jwt_secret: String,
    pub jwt_expiration_millis: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let app_env = AppEnv::from_env();

        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let jwt_secret =
            std::env::var("JWT_SECRET").unwrap_or_else(|_| DEV_FALLBACK_SECRET.to_string());

        validate_jwt_secret(app_env, &jwt_secret)?;

        let jwt_expiration_millis = std::env::var("JWT_EXPIRATION_MILLIS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(DEFAULT_EXPIRATION_MILLIS);

        if jwt_expiration_millis <= 0 {
            return Err(ConfigError::Invalid("JWT_EXPIRATION_MILLIS"));
        }

        Ok(Self {
            addr,
            database_url,
            app_env,
            cors_allowed_origins,
            jwt_secret,
            jwt_expiration_millis,
        })
    }
}

/// production で弱い/既定の秘密鍵のまま起動しないためのチェック。
/// development ではフォールバックを許す。
fn validate_jwt_secret(app_env: AppEnv, secret: &str) -> Result<(), ConfigError> {
    if !app_env.is_production() {
        return Ok(());
    }
    if secret == DEV_FALLBACK_SECRET || secret.len() < 32 {
        return Err(ConfigError::Invalid("JWT_SECRET"));
    }
    Ok(())
}
