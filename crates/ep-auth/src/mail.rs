//! Outgoing mail.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;

use crate::error::AuthResult;

/// A plain-text message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MailMessage {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Message body.
    pub body: String,
}

/// Sends mail on behalf of the account flows.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Delivers a message.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Mail` if delivery fails.
    async fn send(&self, message: MailMessage) -> AuthResult<()>;
}

/// Mailer that only logs what it would send.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMailer;

#[async_trait]
impl Mailer for TracingMailer {
    async fn send(&self, message: MailMessage) -> AuthResult<()> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            "mail queued"
        );
        tracing::debug!(body = %message.body, "mail body");
        Ok(())
    }
}

/// Mailer that keeps every message in memory.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<MailMessage>>,
}

impl RecordingMailer {
    /// Creates an empty recording mailer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the messages sent so far.
    #[must_use]
    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: MailMessage) -> AuthResult<()> {
        self.sent.lock().push(message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn recording_mailer_keeps_messages() {
        let mailer = RecordingMailer::new();
        mailer
            .send(MailMessage {
                to: "ana@example.org".to_string(),
                subject: "Hello".to_string(),
                body: "Body".to_string(),
            })
            .await
            .unwrap();

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ana@example.org");
    }

    #[tokio::test]
    async fn tracing_mailer_accepts_everything() {
        let message = MailMessage {
            to: "x@example.org".to_string(),
            subject: String::new(),
            body: String::new(),
        };
        assert!(TracingMailer.send(message).await.is_ok());
    }
}
