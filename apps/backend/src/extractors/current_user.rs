//! The "get current user" pipeline.
//!
//! Ordering is load-bearing: signature and expiry are checked before the
//! cache is consulted, because the cache key is the raw token string. A
//! forged cache entry must never be reachable without a validly signed,
//! unexpired token — decode-then-trust-cache, never trust-cache-then-decode.

use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use serde::Serialize;
use tracing::debug;

use crate::auth::jwt::{decode_token, now_ts, validate_claims, TokenPurpose};
use crate::entities::users::UserRole;
use crate::extractors::auth_token::AuthToken;
use crate::repos::users as users_repo;
use crate::services::user_cache::CachedUser;
use crate::state::app_state::AppState;
use crate::AppError;

/// Authenticated user snapshot handed to route handlers.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub confirmed: bool,
    pub avatar: Option<String>,
}

impl From<CachedUser> for CurrentUser {
    fn from(user: CachedUser) -> Self {
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

/// Resolve a presented access token to a user.
///
/// Steps, each a possible exit:
/// 1. decode + purpose check (401 invalid token)
/// 2. iat/exp window check (401 token expired)
/// 3. cache hit -> return snapshot
/// 4. persistent lookup by subject (401 if absent)
/// 5. repopulate cache with the token's own expiry
pub async fn resolve_current_user(
    state: &AppState,
    token: &str,
) -> Result<CurrentUser, AppError> {
    let claims = decode_token(token, &state.security)?;
    if claims.purpose != TokenPurpose::Access {
        return Err(AppError::unauthorized_invalid_token());
    }
    validate_claims(&claims, now_ts())?;

    // Safe to trust the cache now that steps 1-2 passed.
    if let Some(cached) = state.user_cache.get(token).await {
        return Ok(CurrentUser::from(cached));
    }

    let db = state.require_db()?;
    let user = users_repo::find_by_username(db, &claims.sub)
        .await?
        .ok_or_else(|| AppError::unauthorized("Unable to verify credentials"))?;

    debug!(username = %user.username, "resolved user from persistent store");
    let snapshot = CachedUser::from(user);
    state.user_cache.put(token, &snapshot, claims.exp).await;

    Ok(CurrentUser::from(snapshot))
}

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = std::pin::Pin<Box<dyn std::future::Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            let token = AuthToken::from_headers(&req)?;

            let state = req
                .app_data::<web::Data<AppState>>()
                .cloned()
                .ok_or_else(|| AppError::internal("AppState not available".to_string()))?;

            resolve_current_user(&state, &token.token).await
        })
    }
}
