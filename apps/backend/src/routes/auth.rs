//! Registration, login, email confirmation and password reset endpoints.

use std::time::SystemTime;

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::jwt::{mint_access_token, TokenPurpose};
use crate::auth::password::{hash_password, verify_password};
use crate::repos::users as users_repo;
use crate::routes::users::UserResponse;
use crate::services::email as email_service;
use crate::services::users as users_service;
use crate::services::users::ConfirmOutcome;
use crate::state::app_state::AppState;
use crate::AppError;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
struct RegisterResponse {
    user: UserResponse,
    detail: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
struct TokenResponse {
    access_token: String,
    token_type: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: String,
}

fn message(text: &str) -> HttpResponse {
    HttpResponse::Ok().json(MessageResponse {
        message: text.to_string(),
    })
}

/// Hash on the blocking pool; argon2 would stall the async workers.
async fn hash_blocking(password: String) -> Result<String, AppError> {
    web::block(move || hash_password(&password))
        .await
        .map_err(|e| AppError::internal(format!("Blocking task failed: {e}")))?
}

async fn register(
    app_state: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let payload = body.into_inner();
    let hashed = hash_blocking(payload.password).await?;

    let db = app_state.require_db()?;
    let user = users_service::register_user(db, &payload.username, &payload.email, &hashed).await?;

    email_service::send_confirmation_email(
        &app_state.mailer,
        &app_state.security,
        &user.email,
        &user.username,
        &app_state.public_base_url,
    )?;

    Ok(HttpResponse::Created().json(RegisterResponse {
        user: UserResponse::from(user),
        detail: "User successfully created. Check your email for confirmation.".to_string(),
    }))
}

async fn login(
    app_state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let payload = body.into_inner();

    let db = app_state.require_db()?;
    let user = users_repo::find_by_username(db, &payload.username)
        .await?
        .ok_or_else(|| AppError::unauthorized("Incorrect user or password"))?;

    // Credentials are checked before the confirmation gate: a wrong password
    // must not reveal whether the account's email is confirmed.
    let stored = user.hashed_password.clone();
    let verified = web::block(move || verify_password(&payload.password, &stored))
        .await
        .map_err(|e| AppError::internal(format!("Blocking task failed: {e}")))?;
    if !verified {
        return Err(AppError::unauthorized("Incorrect user or password"));
    }

    if !user.confirmed {
        return Err(AppError::unauthorized("Email is not confirmed"));
    }

    let access_token = mint_access_token(
        &user.username,
        app_state.access_token_ttl,
        SystemTime::now(),
        &app_state.security,
    )?;

    Ok(HttpResponse::Ok().json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

/// Link target from the confirmation mail.
async fn confirmed_email(
    app_state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let token = path.into_inner();
    let email =
        email_service::redeem_purpose_token(&token, TokenPurpose::Confirm, &app_state.security)?;

    let db = app_state.require_db()?;
    match users_service::confirm_email(db, &email).await? {
        ConfirmOutcome::Confirmed => Ok(message("Email confirmed")),
        ConfirmOutcome::AlreadyConfirmed => Ok(message("Your email is already confirmed")),
    }
}

/// Re-send the confirmation mail for a known, unconfirmed address.
async fn confirm_email(
    app_state: web::Data<AppState>,
    body: web::Json<EmailRequest>,
) -> Result<HttpResponse, AppError> {
    let payload = body.into_inner();

    let db = app_state.require_db()?;
    let user = users_repo::find_by_email(db, &payload.email)
        .await?
        .ok_or_else(|| {
            AppError::bad_request("USER_NOT_FOUND", "User is not found".to_string())
        })?;

    if user.confirmed {
        return Ok(message("Your email is already confirmed"));
    }

    email_service::send_confirmation_email(
        &app_state.mailer,
        &app_state.security,
        &user.email,
        &user.username,
        &app_state.public_base_url,
    )?;

    Ok(message("Check your email for confirmation"))
}

/// Request a reset mail. The response never reveals whether the address is
/// registered.
async fn reset_password(
    app_state: web::Data<AppState>,
    body: web::Json<EmailRequest>,
) -> Result<HttpResponse, AppError> {
    let payload = body.into_inner();

    let db = app_state.require_db()?;
    if let Some(user) = users_repo::find_by_email(db, &payload.email).await? {
        email_service::send_reset_password(
            &app_state.mailer,
            &app_state.security,
            &user.email,
            &user.username,
            &app_state.public_base_url,
        )?;
    }

    Ok(message("Check your email for reset instructions"))
}

/// Redeem a reset token and overwrite the password hash.
async fn reseted_password(
    app_state: web::Data<AppState>,
    body: web::Json<ResetPasswordRequest>,
) -> Result<HttpResponse, AppError> {
    let payload = body.into_inner();
    let email = email_service::redeem_purpose_token(
        &payload.token,
        TokenPurpose::Reset,
        &app_state.security,
    )?;

    let hashed = hash_blocking(payload.password).await?;

    let db = app_state.require_db()?;
    users_service::reset_password(db, &email, hashed).await?;

    Ok(message("Password successfully updated"))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/register", web::post().to(register))
            .route("/login", web::post().to(login))
            .route("/confirmed_email/{token}", web::get().to(confirmed_email))
            .route("/confirm_email", web::post().to(confirm_email))
            .route("/reset_password", web::post().to(reset_password))
            .route("/reseted_password", web::post().to(reseted_password)),
    );
}
