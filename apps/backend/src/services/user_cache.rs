//! Read-through cache for resolved users, keyed by the raw access token.
//!
//! The cache is a lookup accelerator for the persistence round-trip only,
//! never a trust boundary: the identity resolver always verifies the token's
//! signature and expiry before touching the cache. Entries carry the token's
//! own `exp` as absolute expiry, so a cache entry can never outlive the token
//! that indexes it.
//!
//! All operations are best-effort. A failing cache store degrades `get` to a
//! miss and `put`/`evict` to no-ops; resolution then falls back to the
//! database instead of failing the request.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use redis::aio::ConnectionManager;
use redis::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::auth::jwt::now_ts;
use crate::entities::users::{self, UserRole};
use crate::AppError;

/// Denormalized user snapshot stored in the cache. Deliberately excludes the
/// password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub confirmed: bool,
    pub avatar: Option<String>,
}

impl From<users::Model> for CachedUser {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            confirmed: user.confirmed,
            avatar: user.avatar,
        }
    }
}

#[async_trait]
pub trait UserCache: Send + Sync {
    /// Look up a snapshot by raw token. Absent on miss, expired entry, or
    /// store/decode failure.
    async fn get(&self, token: &str) -> Option<CachedUser>;

    /// Store a snapshot with the access token's own `exp` (epoch seconds) as
    /// absolute expiry.
    async fn put(&self, token: &str, user: &CachedUser, expires_at: i64);

    /// Explicit removal, used when the cached snapshot is known stale.
    async fn evict(&self, token: &str);
}

/// Redis-backed cache using per-key absolute expiry (`SET ... EXAT`).
pub struct RedisUserCache {
    manager: ConnectionManager,
}

impl RedisUserCache {
    pub async fn connect(redis_url: &str) -> Result<Self, AppError> {
        let client = Client::open(redis_url)
            .map_err(|e| AppError::config(format!("Invalid REDIS_URL: {e}")))?;
        let manager = ConnectionManager::new(client).await.map_err(|e| {
            AppError::config(format!("Unable to initialize Redis connection manager: {e}"))
        })?;
        Ok(Self { manager })
    }
}

#[async_trait]
impl UserCache for RedisUserCache {
    async fn get(&self, token: &str) -> Option<CachedUser> {
        let mut conn = self.manager.clone();
        let raw: Option<String> = match redis::cmd("GET")
            .arg(token)
            .query_async(&mut conn)
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "cache read failed, treating as miss");
                return None;
            }
        };

        let raw = raw?;
        match serde_json::from_str::<CachedUser>(&raw) {
            Ok(user) => {
                debug!(username = %user.username, "cache hit");
                Some(user)
            }
            Err(e) => {
                warn!(error = %e, "stored cache snapshot failed to decode, treating as miss");
                None
            }
        }
    }

    async fn put(&self, token: &str, user: &CachedUser, expires_at: i64) {
        let serialized = match serde_json::to_string(user) {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "failed to serialize cache snapshot");
                return;
            }
        };

        let mut conn = self.manager.clone();
        let result: Result<(), redis::RedisError> = redis::cmd("SET")
            .arg(token)
            .arg(serialized)
            .arg("EXAT")
            .arg(expires_at)
            .query_async(&mut conn)
            .await;
        if let Err(e) = result {
            warn!(error = %e, "cache write failed, continuing without cache");
        }
    }

    async fn evict(&self, token: &str) {
        let mut conn = self.manager.clone();
        let result: Result<(), redis::RedisError> =
            redis::cmd("DEL").arg(token).query_async(&mut conn).await;
        if let Err(e) = result {
            warn!(error = %e, "cache evict failed");
        }
    }
}

/// In-process cache used when no REDIS_URL is configured, and by tests.
/// Expiry is checked lazily at read time; expired entries are dropped.
#[derive(Default)]
pub struct MemoryUserCache {
    entries: Mutex<HashMap<String, (CachedUser, i64)>>,
}

impl MemoryUserCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lookup with an explicit "now", letting tests advance the clock.
    pub fn get_at(&self, token: &str, now: i64) -> Option<CachedUser> {
        let mut entries = self.entries.lock();
        match entries.get(token) {
            Some((_, expires_at)) if now >= *expires_at => {
                entries.remove(token);
                None
            }
            Some((user, _)) => Some(user.clone()),
            None => None,
        }
    }
}

#[async_trait]
impl UserCache for MemoryUserCache {
    async fn get(&self, token: &str) -> Option<CachedUser> {
        self.get_at(token, now_ts())
    }

    async fn put(&self, token: &str, user: &CachedUser, expires_at: i64) {
        self.entries
            .lock()
            .insert(token.to_string(), (user.clone(), expires_at));
    }

    async fn evict(&self, token: &str) {
        self.entries.lock().remove(token);
    }
}
