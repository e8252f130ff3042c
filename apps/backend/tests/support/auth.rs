use std::time::{Duration, SystemTime};

use backend::auth::jwt::mint_access_token;
use backend::auth::password::hash_password;
use backend::entities::users::{self, UserRole};
use backend::repos::users as users_repo;
use backend::state::app_state::AppState;
use backend::AppError;
use sea_orm::{ActiveModelTrait, Set};

use crate::common::{unique_email, unique_str};

pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Seed a confirmed user directly through the repository layer and mint a
/// valid access token for it.
pub async fn seed_confirmed_user(
    state: &AppState,
    prefix: &str,
) -> Result<(users::Model, String), AppError> {
    let db = state.require_db()?;
    let hashed = hash_password(TEST_PASSWORD)?;
    let user = users_repo::insert_user(
        db,
        &unique_str(prefix),
        &unique_email(prefix),
        &hashed,
    )
    .await?;
    let user = users_repo::mark_confirmed(db, user).await?;

    let token = mint_access_token(
        &user.username,
        Duration::from_secs(900),
        SystemTime::now(),
        &state.security,
    )?;

    Ok((user, token))
}

/// Seed a confirmed admin and mint a valid access token for it.
pub async fn seed_admin_user(
    state: &AppState,
    prefix: &str,
) -> Result<(users::Model, String), AppError> {
    let (user, token) = seed_confirmed_user(state, prefix).await?;

    let db = state.require_db()?;
    let mut active: users::ActiveModel = user.into();
    active.role = Set(UserRole::Admin);
    let user = active
        .update(db)
        .await
        .map_err(|e| AppError::db(e.to_string()))?;

    Ok((user, token))
}

/// Bearer header tuple for a token.
pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {token}"))
}
