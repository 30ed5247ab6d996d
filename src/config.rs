/*
 * Responsibility
 * - 環境変数や設定の読み込み (session key, identity provider API, route table, CORS など)
 * - 設定値のバリデーション (不足なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::services::access::routes::{DEFAULT_ADMIN_ROUTES, DEFAULT_PUBLIC_ROUTES};
use crate::services::identity::SessionKey;
use crate::state::DEFAULT_SESSION_COOKIE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: Option<&str>) -> Self {
        match raw.unwrap_or("development").to_ascii_lowercase().as_str() {
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

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,
    pub request_timeout: Duration,

    pub session_key: SessionKey,
    pub session_issuer: Option<String>,
    pub session_audience: Option<String>,
    pub session_leeway_seconds: u64,
    pub session_cookie_name: String,
    pub sign_in_url: String,

    pub idp_api_url: String,
    pub idp_secret_key: String,

    pub valkey_url: Option<String>,
    pub view_cache_ttl_seconds: u64,

    pub public_routes: Vec<String>,
    pub admin_routes: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment, or a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Unset and blank are the same thing.
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port: u16 = match get("PORT") {
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 3000,
        };
        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(get("APP_ENV").as_deref());

        let cors_allowed_origins = split_list(get("CORS_ALLOWED_ORIGINS"));

        let request_timeout = Duration::from_secs(parse_or(
            get("REQUEST_TIMEOUT_SECONDS"),
            "REQUEST_TIMEOUT_SECONDS",
            30,
        )?);

        // PEM keys are often passed on one line with literal "\n".
        let session_key = match (
            get("SESSION_JWT_PUBLIC_KEY_PEM"),
            get("SESSION_JWT_SECRET"),
        ) {
            (Some(pem), _) => SessionKey::RsaPem(pem.replace("\\n", "\n")),
            (None, Some(secret)) => {
                if app_env.is_production() {
                    return Err(ConfigError::Invalid("SESSION_JWT_SECRET"));
                }
                SessionKey::Secret(secret)
            }
            (None, None) => return Err(ConfigError::Missing("SESSION_JWT_PUBLIC_KEY_PEM")),
        };

        let session_issuer = get("SESSION_ISSUER");
        let session_audience = get("SESSION_AUDIENCE");
        let session_leeway_seconds =
            parse_or(get("SESSION_LEEWAY_SECONDS"), "SESSION_LEEWAY_SECONDS", 60)?;
        let session_cookie_name =
            get("SESSION_COOKIE_NAME").unwrap_or_else(|| DEFAULT_SESSION_COOKIE.to_string());
        let sign_in_url = get("SIGN_IN_URL").unwrap_or_else(|| "/sign-in".to_string());

        let idp_api_url = get("IDP_API_URL").ok_or(ConfigError::Missing("IDP_API_URL"))?;
        let idp_secret_key = get("IDP_SECRET_KEY").ok_or(ConfigError::Missing("IDP_SECRET_KEY"))?;

        let valkey_url = get("VALKEY_URL");
        let view_cache_ttl_seconds =
            parse_or(get("VIEW_CACHE_TTL_SECONDS"), "VIEW_CACHE_TTL_SECONDS", 300)?;

        let public_routes = get("PUBLIC_ROUTES")
            .map(|v| split_list(Some(v)))
            .unwrap_or_else(|| owned(DEFAULT_PUBLIC_ROUTES));
        let admin_routes = get("ADMIN_ROUTES")
            .map(|v| split_list(Some(v)))
            .unwrap_or_else(|| owned(DEFAULT_ADMIN_ROUTES));

        Ok(Self {
            addr,
            app_env,
            cors_allowed_origins,
            request_timeout,
            session_key,
            session_issuer,
            session_audience,
            session_leeway_seconds,
            session_cookie_name,
            sign_in_url,
            idp_api_url,
            idp_secret_key,
            valkey_url,
            view_cache_ttl_seconds,
            public_routes,
            admin_routes,
        })
    }
}

fn parse_or(raw: Option<String>, key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match raw {
        Some(v) => v.parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

fn split_list(raw: Option<String>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
