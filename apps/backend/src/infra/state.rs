//! Unified AppState construction for the server binary and tests.

use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::infra::db::bootstrap_db;
use crate::services::avatar::AvatarStore;
use crate::services::mail::{LoggingTransport, MailTransport, Mailer};
use crate::services::user_cache::{MemoryUserCache, RedisUserCache, UserCache};
use crate::state::app_state::AppState;
use crate::state::security_config::SecurityConfig;
use crate::AppError;

const DEFAULT_ACCESS_TOKEN_TTL: Duration = Duration::from_secs(15 * 60);

/// Builder for creating AppState instances (used in both tests and main).
pub struct StateBuilder {
    security_config: SecurityConfig,
    database_url: Option<String>,
    redis_url: Option<String>,
    access_token_ttl: Duration,
    mail_transport: Option<Arc<dyn MailTransport>>,
    avatars: Option<AvatarStore>,
    public_base_url: String,
}

impl StateBuilder {
    pub fn new() -> Self {
        Self {
            security_config: SecurityConfig::default(),
            database_url: None,
            redis_url: None,
            access_token_ttl: DEFAULT_ACCESS_TOKEN_TTL,
            mail_transport: None,
            avatars: None,
            public_base_url: "http://localhost:8000".to_string(),
        }
    }

    pub fn with_security(mut self, security_config: SecurityConfig) -> Self {
        self.security_config = security_config;
        self
    }

    pub fn with_db_url(mut self, database_url: impl Into<String>) -> Self {
        self.database_url = Some(database_url.into());
        self
    }

    pub fn with_redis_url(mut self, redis_url: impl Into<String>) -> Self {
        self.redis_url = Some(redis_url.into());
        self
    }

    pub fn with_access_token_ttl(mut self, ttl: Duration) -> Self {
        self.access_token_ttl = ttl;
        self
    }

    pub fn with_mail_transport(mut self, transport: Arc<dyn MailTransport>) -> Self {
        self.mail_transport = Some(transport);
        self
    }

    pub fn with_avatars(mut self, avatars: AvatarStore) -> Self {
        self.avatars = Some(avatars);
        self
    }

    pub fn with_public_base_url(mut self, url: impl Into<String>) -> Self {
        self.public_base_url = url.into();
        self
    }

    /// Populate connection settings from the application config.
    pub fn with_config(mut self, config: &AppConfig) -> Result<Self, AppError> {
        self.database_url = Some(config.database_url.clone());
        self.redis_url = config.redis_url.clone();
        self.access_token_ttl = config.access_token_ttl;
        self.public_base_url = config.public_base_url.clone();
        self.security_config = SecurityConfig::new(config.jwt_secret.as_bytes());
        self.avatars = Some(AvatarStore::from_config(&config.avatars)?);
        Ok(self)
    }

    /// Single entrypoint: connect + migrate the database, wire the cache,
    /// spawn the mail worker.
    pub async fn build(self) -> Result<AppState, AppError> {
        let db = match &self.database_url {
            Some(url) => Some(bootstrap_db(url).await?),
            None => None,
        };

        let user_cache: Arc<dyn UserCache> = match &self.redis_url {
            Some(url) => Arc::new(RedisUserCache::connect(url).await?),
            None => Arc::new(MemoryUserCache::new()),
        };

        let transport = self
            .mail_transport
            .unwrap_or_else(|| Arc::new(LoggingTransport));
        let mailer = Mailer::spawn(transport);

        let avatars = match self.avatars {
            Some(avatars) => avatars,
            None => AvatarStore::memory()?,
        };

        Ok(AppState::new(
            db,
            self.security_config,
            self.access_token_ttl,
            user_cache,
            mailer,
            avatars,
            self.public_base_url,
        ))
    }
}

impl Default for StateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn build_state() -> StateBuilder {
    StateBuilder::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn build_succeeds_without_db() {
        let state = build_state().build().await.unwrap();
        assert!(state.db().is_none());
        assert!(state.require_db().is_err());
    }
}
