use async_trait::async_trait;
use thiserror::Error;

/// A fully rendered notification ready to hand to a relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub from_name: String,
    pub from: String,
    pub to: String,
    pub reply_to: String,
    pub subject: String,
    pub html: String,
}

/// Delivery backend for notification mail.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> Result<(), NotificationError>;
}

/// Transport used when no relay is configured; every send fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledTransport;

#[async_trait]
impl MailTransport for DisabledTransport {
    async fn send(&self, _mail: OutgoingMail) -> Result<(), NotificationError> {
        Err(NotificationError::NotConfigured)
    }
}

/// Errors that can occur while delivering a notification.
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("mail relay is not configured")]
    NotConfigured,
    #[error("invalid {role} address: {source}")]
    InvalidAddress {
        role: &'static str,
        source: lettre::address::AddressError,
    },
    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("mail relay error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}
