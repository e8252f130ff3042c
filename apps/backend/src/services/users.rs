//! User account operations: registration, confirmation, password reset,
//! avatar updates.

use sea_orm::ConnectionTrait;
use tracing::{debug, info};

use crate::entities::users;
use crate::logging::pii::Redacted;
use crate::repos::users as users_repo;
use crate::AppError;

/// Outcome of an email confirmation attempt for a known user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Confirmed,
    AlreadyConfirmed,
}

/// Create a new, unconfirmed user with an already-hashed password.
///
/// Duplicates are rejected with 409 before the insert; the unique indexes
/// remain the backstop for concurrent registrations.
pub async fn register_user(
    conn: &(impl ConnectionTrait + Send + Sync),
    username: &str,
    email: &str,
    hashed_password: &str,
) -> Result<users::Model, AppError> {
    if users_repo::find_by_email(conn, email).await?.is_some() {
        return Err(AppError::conflict(
            "UNIQUE_EMAIL",
            "User with such email already exists".to_string(),
        ));
    }
    if users_repo::find_by_username(conn, username)
        .await?
        .is_some()
    {
        return Err(AppError::conflict(
            "UNIQUE_USERNAME",
            "User with such username already exists".to_string(),
        ));
    }

    let user = users_repo::insert_user(conn, username, email, hashed_password).await?;
    info!(
        user_id = user.id,
        username = %user.username,
        email = %Redacted(&user.email),
        "user registered"
    );
    Ok(user)
}

/// Confirm the email recovered from a verification token.
/// Unknown emails are a 400, not a 404, to keep the route's error surface
/// matching the verification-link flow.
pub async fn confirm_email(
    conn: &(impl ConnectionTrait + Send + Sync),
    email: &str,
) -> Result<ConfirmOutcome, AppError> {
    let user = users_repo::find_by_email(conn, email)
        .await?
        .ok_or_else(|| {
            AppError::bad_request("VERIFICATION_ERROR", "Verification error".to_string())
        })?;

    if user.confirmed {
        return Ok(ConfirmOutcome::AlreadyConfirmed);
    }

    debug!(email = %Redacted(email), "confirming email");
    users_repo::mark_confirmed(conn, user).await?;
    Ok(ConfirmOutcome::Confirmed)
}

/// Overwrite the password hash for the user owning `email`.
/// Fails before any mutation when no such user exists.
pub async fn reset_password(
    conn: &(impl ConnectionTrait + Send + Sync),
    email: &str,
    hashed_password: String,
) -> Result<users::Model, AppError> {
    let user = users_repo::find_by_email(conn, email)
        .await?
        .ok_or_else(|| {
            AppError::bad_request("USER_NOT_FOUND", "User is not found".to_string())
        })?;

    let user = users_repo::update_password(conn, user, hashed_password).await?;
    info!(user_id = user.id, "password reset");
    Ok(user)
}

/// Persist a freshly uploaded avatar URL for the user.
pub async fn update_avatar(
    conn: &(impl ConnectionTrait + Send + Sync),
    username: &str,
    avatar_url: String,
) -> Result<users::Model, AppError> {
    let user = users_repo::find_by_username(conn, username)
        .await?
        .ok_or_else(|| AppError::unauthorized("Unable to verify credentials"))?;

    debug!(username = %username, "updating avatar");
    users_repo::update_avatar(conn, user, avatar_url).await
}
