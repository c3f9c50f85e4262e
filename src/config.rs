/*
 * Responsibility
 * - 環境変数からゲートウェイ設定を読み込む (JWT secret, 除外パス, 認可ルール, upstream)
 * - 設定値のバリデーション (不足・不正なら起動失敗)
 * - secret は Debug でも出力しない
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::services::auth::AuthorizationPolicy;

/// HS256 needs at least 256 bits of key material.
pub const MIN_SECRET_BYTES: usize = 32;

pub const DEFAULT_EXCLUDED_PATHS: &str = "/api/auth/register,/api/auth/login";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: Option<String>) -> Self {
        match raw
            .unwrap_or_else(|| "development".to_string())
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

#[derive(Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    // HMAC key material for access tokens. Never logged.
    pub jwt_secret: String,
    pub jwt_leeway_seconds: u64,

    pub excluded_paths: Vec<String>,
    pub access_policy: AuthorizationPolicy,

    pub upstream_base_url: Url,
    pub request_timeout: Duration,
    pub request_body_limit_bytes: usize,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("jwt_leeway_seconds", &self.jwt_leeway_seconds)
            .field("excluded_paths", &self.excluded_paths)
            .field("access_policy", &self.access_policy)
            .field("upstream_base_url", &self.upstream_base_url.as_str())
            .field("request_timeout", &self.request_timeout)
            .field("request_body_limit_bytes", &self.request_body_limit_bytes)
            .finish_non_exhaustive()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key → value source (the process environment in `from_env`).
    pub fn from_lookup<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = var("PORT").and_then(|s| s.parse().ok()).unwrap_or(8080);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(var("APP_ENV"));

        let cors_allowed_origins = parse_list(&var("CORS_ALLOWED_ORIGINS").unwrap_or_default());

        let jwt_secret = var("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.len() < MIN_SECRET_BYTES {
            return Err(ConfigError::Invalid("JWT_SECRET"));
        }

        let jwt_leeway_seconds = var("JWT_LEEWAY_SECONDS")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);

        let excluded_paths = parse_list(
            &var("AUTH_EXCLUDED_PATHS").unwrap_or_else(|| DEFAULT_EXCLUDED_PATHS.to_string()),
        );

        let access_policy = match var("ACCESS_POLICY_RULES") {
            Some(raw) => raw
                .parse::<AuthorizationPolicy>()
                .map_err(|_| ConfigError::Invalid("ACCESS_POLICY_RULES"))?,
            None => AuthorizationPolicy::employer_default(),
        };

        let upstream_base_url =
            var("UPSTREAM_BASE_URL").ok_or(ConfigError::Missing("UPSTREAM_BASE_URL"))?;
        let upstream_base_url =
            Url::parse(&upstream_base_url).map_err(|_| ConfigError::Invalid("UPSTREAM_BASE_URL"))?;
        if !matches!(upstream_base_url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid("UPSTREAM_BASE_URL"));
        }

        let request_timeout = var("REQUEST_TIMEOUT_SECONDS")
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(30));

        let request_body_limit_bytes = var("REQUEST_BODY_LIMIT_BYTES")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(1024 * 1024); // 1 MiB

        Ok(Self {
            addr,
            app_env,
            cors_allowed_origins,
            jwt_secret,
            jwt_leeway_seconds,
            excluded_paths,
            access_policy,
            upstream_base_url,
            request_timeout,
            request_body_limit_bytes,
        })
    }
}

// Comma-separated list; blanks are dropped so an empty entry can never match every path.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
