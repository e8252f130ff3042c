use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::state::security_config::SecurityConfig;
use crate::AppError;

/// Fixed lifetime for confirmation/reset tokens mailed to users.
pub const PURPOSE_TOKEN_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// What a token is allowed to be redeemed for.
///
/// Access tokens authenticate API calls; confirm/reset tokens are mailed out
/// and carry an email as subject. Redemption through the wrong flow is
/// rejected, so a confirmation link can never reset a password.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenPurpose {
    Access,
    Confirm,
    Reset,
}

/// Claims included in our backend-issued tokens.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject: username for access tokens, email for purpose tokens.
    pub sub: String,
    pub purpose: TokenPurpose,
    /// Issued-at (seconds since epoch)
    pub iat: i64,
    /// Expiry (seconds since epoch)
    pub exp: i64,
}

/// Mint a signed token with `iat = now` and `exp = now + ttl`.
pub fn mint_token(
    sub: &str,
    purpose: TokenPurpose,
    ttl: Duration,
    now: SystemTime,
    security: &SecurityConfig,
) -> Result<String, AppError> {
    let iat = now
        .duration_since(UNIX_EPOCH)
        .map_err(|_| AppError::internal("Failed to get current time".to_string()))?
        .as_secs() as i64;
    let exp = iat + ttl.as_secs() as i64;

    let claims = Claims {
        sub: sub.to_string(),
        purpose,
        iat,
        exp,
    };

    encode(
        &Header::new(security.algorithm),
        &claims,
        &EncodingKey::from_secret(&security.jwt_secret),
    )
    .map_err(|e| AppError::internal(format!("Failed to encode JWT: {e}")))
}

/// Mint an access token carrying the username as subject.
pub fn mint_access_token(
    username: &str,
    ttl: Duration,
    now: SystemTime,
    security: &SecurityConfig,
) -> Result<String, AppError> {
    mint_token(username, TokenPurpose::Access, ttl, now, security)
}

/// Mint a 7-day confirmation or reset token carrying the email as subject.
pub fn mint_purpose_token(
    email: &str,
    purpose: TokenPurpose,
    now: SystemTime,
    security: &SecurityConfig,
) -> Result<String, AppError> {
    mint_token(email, purpose, PURPOSE_TOKEN_TTL, now, security)
}

/// Verify signature and structure, returning the decoded claims.
///
/// Expiry is deliberately NOT enforced here: callers check `iat`/`exp`
/// against wall-clock time via [`validate_claims`] so that "bad token" and
/// "expired token" remain distinguishable failures.
pub fn decode_token(token: &str, security: &SecurityConfig) -> Result<Claims, AppError> {
    let mut validation = Validation::new(security.algorithm);
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(&security.jwt_secret),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized_invalid_token())
}

/// Reject claims that are not yet valid (`iat > now`, clock-skew guard) or
/// already expired (`now > exp`).
pub fn validate_claims(claims: &Claims, now: i64) -> Result<(), AppError> {
    if claims.iat > now || now > claims.exp {
        return Err(AppError::unauthorized_expired_token());
    }
    Ok(())
}

/// Current wall-clock time as epoch seconds.
pub fn now_ts() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    use super::{
        decode_token, mint_access_token, mint_purpose_token, mint_token, validate_claims,
        TokenPurpose, PURPOSE_TOKEN_TTL,
    };
    use crate::state::security_config::SecurityConfig;
    use crate::AppError;

    fn test_security() -> SecurityConfig {
        SecurityConfig::new("test_secret_key_for_testing_purposes_only".as_bytes())
    }

    #[test]
    fn mint_and_decode_roundtrip() {
        let security = test_security();
        let now = SystemTime::now();
        let ttl = Duration::from_secs(900);

        let token = mint_access_token("alice", ttl, now, &security).unwrap();
        let claims = decode_token(&token, &security).unwrap();

        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.purpose, TokenPurpose::Access);
        assert!(claims.iat < claims.exp);
        assert_eq!(claims.exp - claims.iat, 900);
        assert_eq!(
            claims.iat,
            now.duration_since(UNIX_EPOCH).unwrap().as_secs() as i64
        );
    }

    #[test]
    fn purpose_token_has_seven_day_ttl() {
        let security = test_security();
        let token =
            mint_purpose_token("alice@example.com", TokenPurpose::Confirm, SystemTime::now(), &security)
                .unwrap();
        let claims = decode_token(&token, &security).unwrap();
        assert_eq!(claims.sub, "alice@example.com");
        assert_eq!(claims.exp - claims.iat, PURPOSE_TOKEN_TTL.as_secs() as i64);
    }

    #[test]
    fn tampered_signature_is_invalid_token() {
        let security = test_security();
        let token =
            mint_access_token("alice", Duration::from_secs(900), SystemTime::now(), &security)
                .unwrap();

        // Flip the first character of the signature segment.
        let mut parts: Vec<String> = token.split('.').map(|s| s.to_string()).collect();
        let sig = parts.last_mut().unwrap();
        let flipped = if sig.starts_with('A') { "B" } else { "A" };
        sig.replace_range(..1, flipped);
        let tampered = parts.join(".");

        match decode_token(&tampered, &security) {
            Err(AppError::UnauthorizedInvalidToken) => {}
            other => panic!("expected invalid token error, got {other:?}"),
        }
    }

    #[test]
    fn wrong_secret_is_invalid_token() {
        let token = mint_access_token(
            "alice",
            Duration::from_secs(900),
            SystemTime::now(),
            &SecurityConfig::new("secret-A".as_bytes()),
        )
        .unwrap();

        let result = decode_token(&token, &SecurityConfig::new("secret-B".as_bytes()));
        assert!(matches!(result, Err(AppError::UnauthorizedInvalidToken)));
    }

    #[test]
    fn expired_claims_rejected_even_with_valid_signature() {
        let security = test_security();
        // Minted 20 minutes ago with a 15 minute ttl.
        let past = SystemTime::now() - Duration::from_secs(20 * 60);
        let token =
            mint_access_token("alice", Duration::from_secs(15 * 60), past, &security).unwrap();

        // Signature still verifies...
        let claims = decode_token(&token, &security).unwrap();
        // ...but claim validation fails.
        let result = validate_claims(&claims, super::now_ts());
        assert!(matches!(result, Err(AppError::UnauthorizedExpiredToken)));
    }

    #[test]
    fn not_yet_valid_claims_rejected() {
        let security = test_security();
        let future = SystemTime::now() + Duration::from_secs(3600);
        let token =
            mint_token("alice", TokenPurpose::Access, Duration::from_secs(900), future, &security)
                .unwrap();

        let claims = decode_token(&token, &security).unwrap();
        let result = validate_claims(&claims, super::now_ts());
        assert!(matches!(result, Err(AppError::UnauthorizedExpiredToken)));
    }
}
