//! Confirmation and reset token flow.
//!
//! Both flows mint a 7-day purpose token carrying the email as subject and
//! hand a message to the mail queue. Redemption decodes the token with the
//! same codec used for access tokens but requires the matching purpose, so a
//! confirmation link can never be replayed against the reset endpoint.

use std::time::SystemTime;

use crate::auth::jwt::{decode_token, mint_purpose_token, now_ts, validate_claims, TokenPurpose};
use crate::services::mail::{MailMessage, MailTemplate, Mailer};
use crate::state::security_config::SecurityConfig;
use crate::AppError;

/// Mint a confirmation token and enqueue the confirmation mail.
pub fn send_confirmation_email(
    mailer: &Mailer,
    security: &SecurityConfig,
    email: &str,
    username: &str,
    host: &str,
) -> Result<(), AppError> {
    let token = mint_purpose_token(email, TokenPurpose::Confirm, SystemTime::now(), security)?;
    mailer.enqueue(MailMessage {
        template: MailTemplate::ConfirmEmail,
        recipient: email.to_string(),
        username: username.to_string(),
        token,
        host: host.to_string(),
    });
    Ok(())
}

/// Mint a reset token and enqueue the reset mail.
pub fn send_reset_password(
    mailer: &Mailer,
    security: &SecurityConfig,
    email: &str,
    username: &str,
    host: &str,
) -> Result<(), AppError> {
    let token = mint_purpose_token(email, TokenPurpose::Reset, SystemTime::now(), security)?;
    mailer.enqueue(MailMessage {
        template: MailTemplate::ResetPassword,
        recipient: email.to_string(),
        username: username.to_string(),
        token,
        host: host.to_string(),
    });
    Ok(())
}

/// Redeem a purpose token, returning the email it was issued for.
///
/// Any failure — bad signature, malformed token, expired claims, or a purpose
/// mismatch — collapses into the user-facing "incorrect verification token"
/// error, distinct from access-token 401s.
pub fn redeem_purpose_token(
    token: &str,
    expected: TokenPurpose,
    security: &SecurityConfig,
) -> Result<String, AppError> {
    let claims =
        decode_token(token, security).map_err(|_| AppError::invalid_verification_token())?;
    if claims.purpose != expected {
        return Err(AppError::invalid_verification_token());
    }
    validate_claims(&claims, now_ts()).map_err(|_| AppError::invalid_verification_token())?;
    Ok(claims.sub)
}
