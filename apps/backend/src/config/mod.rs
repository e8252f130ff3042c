//! Environment-based application configuration.
//!
//! All knobs come from environment variables set by the runtime (docker
//! env_file, or a sourced .env for local dev). Required variables produce a
//! `CONFIG_ERROR` naming the missing variable.

use std::env;
use std::time::Duration;

use crate::AppError;

/// Default access token lifetime when ACCESS_TOKEN_TTL_SECS is unset.
const DEFAULT_ACCESS_TOKEN_TTL_SECS: u64 = 15 * 60;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Redis cache store; when absent the in-process cache is used.
    pub redis_url: Option<String>,
    pub jwt_secret: String,
    pub access_token_ttl: Duration,
    /// Base URL rendered into confirmation/reset links.
    pub public_base_url: String,
    pub avatars: AvatarConfig,
}

/// Object storage settings for avatar uploads.
#[derive(Debug, Clone)]
pub struct AvatarConfig {
    /// "s3" or "fs"
    pub backend: String,
    /// Bucket name (s3) or root directory (fs)
    pub location: String,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>,
    /// Public URL prefix under which stored objects are reachable.
    pub public_url: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let host = env::var("BACKEND_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("BACKEND_PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse::<u16>()
            .map_err(|_| AppError::config("BACKEND_PORT must be a valid port number".into()))?;

        let access_token_ttl = match env::var("ACCESS_TOKEN_TTL_SECS") {
            Ok(raw) => Duration::from_secs(raw.parse::<u64>().map_err(|_| {
                AppError::config("ACCESS_TOKEN_TTL_SECS must be a positive integer".into())
            })?),
            Err(_) => Duration::from_secs(DEFAULT_ACCESS_TOKEN_TTL_SECS),
        };

        Ok(Self {
            host,
            port,
            database_url: must_var("DATABASE_URL")?,
            redis_url: env::var("REDIS_URL").ok(),
            jwt_secret: must_var("JWT_SECRET")?,
            access_token_ttl,
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            avatars: AvatarConfig::from_env()?,
        })
    }
}

impl AvatarConfig {
    fn from_env() -> Result<Self, AppError> {
        let backend = env::var("AVATAR_BACKEND").unwrap_or_else(|_| "fs".to_string());
        let location = match backend.as_str() {
            "s3" => must_var("AVATAR_S3_BUCKET")?,
            "fs" => env::var("AVATAR_FS_ROOT").unwrap_or_else(|_| "./data/avatars".to_string()),
            other => {
                return Err(AppError::config(format!(
                    "AVATAR_BACKEND must be 's3' or 'fs', got '{other}'"
                )))
            }
        };

        Ok(Self {
            backend,
            location,
            s3_region: env::var("AVATAR_S3_REGION").ok(),
            s3_endpoint: env::var("AVATAR_S3_ENDPOINT").ok(),
            public_url: env::var("AVATAR_PUBLIC_URL")
                .unwrap_or_else(|_| "http://localhost:8000/static".to_string()),
        })
    }
}

/// Get required environment variable or return a config error naming it.
fn must_var(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::config(format!("{name} must be set")))
}
