//! Fire-and-forget mail dispatch.
//!
//! Handlers enqueue a [`MailMessage`] and return immediately; a background
//! task owns delivery through a [`MailTransport`]. The core never blocks on,
//! or learns about, delivery outcomes.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::logging::pii::Redacted;
use crate::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailTemplate {
    ConfirmEmail,
    ResetPassword,
}

impl MailTemplate {
    pub fn subject(&self) -> &'static str {
        match self {
            MailTemplate::ConfirmEmail => "Confirm your email",
            MailTemplate::ResetPassword => "Reset password",
        }
    }

    /// Render the message body with the link the recipient should follow.
    pub fn render(&self, host: &str, username: &str, token: &str) -> String {
        let host = host.trim_end_matches('/');
        match self {
            MailTemplate::ConfirmEmail => format!(
                "Hi {username},\n\n\
                 Please confirm your email address by following this link:\n\
                 {host}/api/auth/confirmed_email/{token}\n\n\
                 The link is valid for 7 days.\n"
            ),
            MailTemplate::ResetPassword => format!(
                "Hi {username},\n\n\
                 A password reset was requested for your account. Follow this \
                 link to choose a new password:\n\
                 {host}/api/auth/reseted_password/{token}\n\n\
                 The link is valid for 7 days. If you did not request a reset, \
                 ignore this message.\n"
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MailMessage {
    pub template: MailTemplate,
    pub recipient: String,
    pub username: String,
    pub token: String,
    pub host: String,
}

/// Delivery seam. Implementations are external collaborators (SMTP relay,
/// provider API); the default just logs the rendered message.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: &MailMessage) -> Result<(), AppError>;
}

/// Transport that logs outgoing mail instead of delivering it.
pub struct LoggingTransport;

#[async_trait]
impl MailTransport for LoggingTransport {
    async fn send(&self, message: &MailMessage) -> Result<(), AppError> {
        tracing::info!(
            recipient = %Redacted(&message.recipient),
            subject = message.template.subject(),
            "outgoing mail (logging transport)"
        );
        Ok(())
    }
}

/// Handle for enqueueing mail. Cheap to clone; the receiving worker is
/// spawned once at startup.
#[derive(Clone)]
pub struct Mailer {
    tx: mpsc::UnboundedSender<MailMessage>,
}

impl Mailer {
    /// Spawn the dispatch worker and return the enqueue handle.
    pub fn spawn(transport: Arc<dyn MailTransport>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<MailMessage>();

        tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                if let Err(e) = transport.send(&message).await {
                    warn!(
                        recipient = %Redacted(&message.recipient),
                        error = %e,
                        "mail delivery failed"
                    );
                }
            }
        });

        Self { tx }
    }

    /// Enqueue a message. Never fails the caller; a closed queue is logged
    /// and dropped.
    pub fn enqueue(&self, message: MailMessage) {
        debug!(
            recipient = %Redacted(&message.recipient),
            subject = message.template.subject(),
            "mail placed on queue"
        );
        if self.tx.send(message).is_err() {
            warn!("mail queue is closed, dropping message");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use parking_lot::Mutex;

    use super::*;

    struct RecordingTransport {
        sent: Arc<Mutex<Vec<MailMessage>>>,
    }

    #[async_trait]
    impl MailTransport for RecordingTransport {
        async fn send(&self, message: &MailMessage) -> Result<(), AppError> {
            self.sent.lock().push(message.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn enqueued_mail_reaches_the_transport() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let mailer = Mailer::spawn(Arc::new(RecordingTransport { sent: sent.clone() }));

        mailer.enqueue(MailMessage {
            template: MailTemplate::ConfirmEmail,
            recipient: "alice@example.test".to_string(),
            username: "alice".to_string(),
            token: "tok".to_string(),
            host: "http://localhost:8000".to_string(),
        });

        for _ in 0..100 {
            if !sent.lock().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let sent = sent.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient, "alice@example.test");
        assert_eq!(sent[0].template, MailTemplate::ConfirmEmail);
    }

    #[test]
    fn rendered_body_contains_link_and_token() {
        let body = MailTemplate::ResetPassword.render("http://h/", "bob", "t0k3n");
        assert!(body.contains("http://h/api/auth/reseted_password/t0k3n"));
        assert!(body.contains("bob"));
    }
}
