use std::sync::Arc;
use std::time::Duration;

use sea_orm::DatabaseConnection;

use super::security_config::SecurityConfig;
use crate::services::avatar::AvatarStore;
use crate::services::mail::Mailer;
use crate::services::user_cache::UserCache;
use crate::AppError;

/// Application state containing shared resources.
///
/// Constructed once at startup via `infra::state::build_state()` and shared
/// across workers with `web::Data`; nothing in here is mutated per-request.
#[derive(Clone)]
pub struct AppState {
    /// Database connection (optional for test scenarios)
    db: Option<DatabaseConnection>,
    /// Security configuration including JWT settings
    pub security: SecurityConfig,
    /// Access token lifetime applied at mint time
    pub access_token_ttl: Duration,
    /// Read-through cache for resolved users, keyed by raw access token
    pub user_cache: Arc<dyn UserCache>,
    /// Fire-and-forget mail queue
    pub mailer: Mailer,
    /// Object storage for avatar images
    pub avatars: AvatarStore,
    /// Base URL used when rendering links in outgoing mail
    pub public_base_url: String,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        db: Option<DatabaseConnection>,
        security: SecurityConfig,
        access_token_ttl: Duration,
        user_cache: Arc<dyn UserCache>,
        mailer: Mailer,
        avatars: AvatarStore,
        public_base_url: String,
    ) -> Self {
        Self {
            db,
            security,
            access_token_ttl,
            user_cache,
            mailer,
            avatars,
            public_base_url,
        }
    }

    pub fn db(&self) -> Option<&DatabaseConnection> {
        self.db.as_ref()
    }

    /// Database handle, or an internal error for states built without one.
    pub fn require_db(&self) -> Result<&DatabaseConnection, AppError> {
        self.db
            .as_ref()
            .ok_or_else(|| AppError::internal("Database connection not available".to_string()))
    }
}
