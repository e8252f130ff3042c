//! Avatar uploads to external object storage via OpenDAL.

use opendal::{services, Operator};
use tracing::debug;

use crate::config::AvatarConfig;
use crate::AppError;

/// Object storage handle for avatar images.
#[derive(Clone)]
pub struct AvatarStore {
    operator: Operator,
    public_url: String,
}

impl AvatarStore {
    pub fn new(operator: Operator, public_url: impl Into<String>) -> Self {
        Self {
            operator,
            public_url: public_url.into(),
        }
    }

    /// Build the store from configuration ("s3" or "fs" backend).
    pub fn from_config(config: &AvatarConfig) -> Result<Self, AppError> {
        let operator = match config.backend.as_str() {
            "s3" => {
                let mut builder = services::S3::default().bucket(&config.location);
                if let Some(region) = &config.s3_region {
                    builder = builder.region(region);
                }
                if let Some(endpoint) = &config.s3_endpoint {
                    builder = builder.endpoint(endpoint);
                }
                Operator::new(builder)
                    .map_err(|e| AppError::config(format!("Invalid S3 avatar config: {e}")))?
                    .finish()
            }
            "fs" => Operator::new(services::Fs::default().root(&config.location))
                .map_err(|e| AppError::config(format!("Invalid fs avatar config: {e}")))?
                .finish(),
            other => {
                return Err(AppError::config(format!(
                    "Unsupported avatar backend '{other}'"
                )))
            }
        };
        Ok(Self::new(operator, config.public_url.clone()))
    }

    /// In-memory store for tests and states built without storage config.
    pub fn memory() -> Result<Self, AppError> {
        let operator = Operator::new(services::Memory::default())
            .map_err(|e| AppError::config(format!("Failed to build memory storage: {e}")))?
            .finish();
        Ok(Self::new(operator, "memory://avatars"))
    }

    /// Store an avatar image, overwriting any previous one for the user, and
    /// return its public URL.
    pub async fn store(
        &self,
        username: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, AppError> {
        let extension = match content_type {
            "image/png" => "png",
            "image/jpeg" => "jpg",
            "image/gif" => "gif",
            "image/webp" => "webp",
            other => {
                return Err(AppError::bad_request(
                    "UNSUPPORTED_MEDIA_TYPE",
                    format!("Unsupported avatar content type '{other}'"),
                ))
            }
        };

        let path = format!("avatars/{username}.{extension}");
        self.operator
            .write(&path, bytes)
            .await
            .map_err(|e| AppError::internal(format!("Avatar upload failed: {e}")))?;

        debug!(path = %path, "avatar stored");
        Ok(format!(
            "{}/{path}",
            self.public_url.trim_end_matches('/')
        ))
    }
}
