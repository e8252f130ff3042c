use actix_web::{dev::Payload, http::header, FromRequest, HttpRequest};

use crate::AppError;

/// Raw bearer token extracted from the Authorization header.
#[derive(Debug, Clone)]
pub struct AuthToken {
    pub token: String,
}

impl AuthToken {
    pub fn from_headers(req: &HttpRequest) -> Result<Self, AppError> {
        let auth_header = req
            .headers()
            .get(header::AUTHORIZATION)
            .ok_or_else(AppError::unauthorized_missing_bearer)?;

        let auth_value = auth_header
            .to_str()
            .map_err(|_| AppError::unauthorized_missing_bearer())?;

        // Expect exactly "Bearer <token>"
        let parts: Vec<&str> = auth_value.split_whitespace().collect();
        if parts.len() != 2 || parts[0] != "Bearer" || parts[1].is_empty() {
            return Err(AppError::unauthorized_missing_bearer());
        }

        Ok(AuthToken {
            token: parts[1].to_string(),
        })
    }
}

impl FromRequest for AuthToken {
    type Error = AppError;
    type Future = std::future::Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        std::future::ready(Self::from_headers(req))
    }
}
