use actix_web::{web, HttpRequest, HttpResponse};
use serde::Serialize;

use crate::entities::users::{self, UserRole};
use crate::extractors::auth_token::AuthToken;
use crate::extractors::current_user::CurrentUser;
use crate::services::users as users_service;
use crate::state::app_state::AppState;
use crate::AppError;

/// Public user representation; never carries the password hash.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub confirmed: bool,
    pub avatar: Option<String>,
}

impl From<users::Model> for UserResponse {
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

impl From<CurrentUser> for UserResponse {
    fn from(user: CurrentUser) -> Self {
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

async fn me(current_user: CurrentUser) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(UserResponse::from(current_user)))
}

/// Raw image body upload, restricted to admins. The stored public URL
/// replaces any previous avatar, and the caller's cache entry is refreshed
/// so `me` reflects the change immediately.
async fn update_avatar(
    req: HttpRequest,
    current_user: CurrentUser,
    app_state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    if current_user.role != UserRole::Admin {
        return Err(AppError::forbidden("Insufficient permissions"));
    }

    if body.is_empty() {
        return Err(AppError::bad_request(
            "EMPTY_BODY",
            "Avatar image body is empty".to_string(),
        ));
    }

    let content_type = req
        .headers()
        .get(actix_web::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();

    let avatar_url = app_state
        .avatars
        .store(&current_user.username, &content_type, body.to_vec())
        .await?;

    let db = app_state.require_db()?;
    let user = users_service::update_avatar(db, &current_user.username, avatar_url).await?;

    // Drop the stale snapshot keyed by this token; the next resolve re-caches.
    let token = AuthToken::from_headers(&req)?;
    app_state.user_cache.evict(&token.token).await;

    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .route("/me", web::get().to(me))
            .route("/avatar", web::put().to(update_avatar)),
    );
}
