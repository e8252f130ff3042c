use std::sync::Arc;

use async_trait::async_trait;
use backend::infra::state::build_state;
use backend::services::mail::{MailMessage, MailTransport};
use backend::state::app_state::AppState;
use backend::state::security_config::SecurityConfig;
use backend::AppError;
use parking_lot::Mutex;

pub const TEST_JWT_SECRET: &str = "test_secret_key_for_testing_purposes_only";

pub fn test_security() -> SecurityConfig {
    SecurityConfig::new(TEST_JWT_SECRET.as_bytes())
}

/// Transport that records outgoing mail instead of delivering it, so tests
/// can pull confirmation/reset tokens out of "sent" messages.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<MailMessage>>,
}

impl RecordingTransport {
    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().clone()
    }

    /// Poll for the next recorded message; delivery runs on a worker task.
    pub async fn wait_for_mail(&self, min_count: usize) -> Vec<MailMessage> {
        for _ in 0..200 {
            let sent = self.sent();
            if sent.len() >= min_count {
                return sent;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        panic!("expected at least {min_count} outgoing mails");
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn send(&self, message: &MailMessage) -> Result<(), AppError> {
        self.sent.lock().push(message.clone());
        Ok(())
    }
}

/// State against an isolated in-memory SQLite database with the in-process
/// cache and object store.
pub async fn build_test_state() -> Result<AppState, AppError> {
    build_state()
        .with_db_url("sqlite::memory:")
        .with_security(test_security())
        .build()
        .await
}

/// Same as [`build_test_state`], but with a recording mail transport.
pub async fn build_test_state_with_mail() -> Result<(AppState, Arc<RecordingTransport>), AppError> {
    let transport = Arc::new(RecordingTransport::default());
    let state = build_state()
        .with_db_url("sqlite::memory:")
        .with_security(test_security())
        .with_mail_transport(transport.clone())
        .build()
        .await?;
    Ok((state, transport))
}
