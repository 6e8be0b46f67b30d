use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::{info, warn};

use contact_relay_core::ContactDraft;
use contact_relay_util::MailConfig;

use crate::smtp::SmtpRelay;
use crate::template;
use crate::transport::{DisabledTransport, MailTransport, NotificationError, OutgoingMail};

const SENDER_NAME: &str = "Portfolio Contact";

/// Fixed addressing used for every notification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailEnvelope {
    pub from: String,
    pub to: String,
}

/// Result of a notification attempt, reported back to the submitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationOutcome {
    pub email_sent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_error: Option<String>,
}

impl NotificationOutcome {
    pub fn sent() -> Self {
        Self {
            email_sent: true,
            email_error: None,
        }
    }

    pub fn failed(err: &NotificationError) -> Self {
        Self {
            email_sent: false,
            email_error: Some(err.to_string()),
        }
    }

    /// Label used for metrics.
    pub fn label(&self) -> &'static str {
        if self.email_sent {
            "sent"
        } else {
            "failed"
        }
    }
}

/// Sends operator notifications for stored submissions.
///
/// Delivery failures never escape [`Notifier::notify`]; they are folded into
/// the returned [`NotificationOutcome`].
#[derive(Clone)]
pub struct Notifier {
    transport: Arc<dyn MailTransport>,
    envelope: MailEnvelope,
    timezone: Tz,
}

impl Notifier {
    pub fn new(transport: Arc<dyn MailTransport>, envelope: MailEnvelope, timezone: Tz) -> Self {
        Self {
            transport,
            envelope,
            timezone,
        }
    }

    /// A notifier whose every attempt reports [`NotificationError::NotConfigured`].
    pub fn disabled(timezone: Tz) -> Self {
        Self::new(Arc::new(DisabledTransport), MailEnvelope::default(), timezone)
    }

    /// Builds an SMTP-backed notifier, or a disabled one when no relay is configured.
    pub fn from_config(
        config: Option<&MailConfig>,
        timezone: Tz,
    ) -> Result<Self, NotificationError> {
        let Some(config) = config else {
            warn!(stage = "mailer", "EMAIL_HOST is not set; notifications are disabled");
            return Ok(Self::disabled(timezone));
        };

        let relay = SmtpRelay::from_config(config)?;
        info!(
            stage = "mailer",
            host = %config.host,
            port = config.port,
            authenticated = config.credentials.is_some(),
            "smtp relay configured"
        );
        Ok(Self::new(
            Arc::new(relay),
            MailEnvelope {
                from: config.from.clone(),
                to: config.to.clone(),
            },
            timezone,
        ))
    }

    /// Renders the message that would be sent for `draft`.
    pub fn compose(&self, draft: &ContactDraft, submitted_at: DateTime<Utc>) -> OutgoingMail {
        let display = submitted_at
            .with_timezone(&self.timezone)
            .format("%Y-%m-%d %H:%M:%S %Z")
            .to_string();

        OutgoingMail {
            from_name: SENDER_NAME.to_string(),
            from: self.envelope.from.clone(),
            to: self.envelope.to.clone(),
            reply_to: draft.email.clone(),
            subject: template::subject(draft),
            html: template::render_html(draft, &display),
        }
    }

    /// Attempts delivery once. Never fails; see [`NotificationOutcome`].
    pub async fn notify(
        &self,
        draft: &ContactDraft,
        submitted_at: DateTime<Utc>,
    ) -> NotificationOutcome {
        let mail = self.compose(draft, submitted_at);
        match self.transport.send(mail).await {
            Ok(()) => {
                info!(stage = "mailer", "notification sent");
                NotificationOutcome::sent()
            }
            Err(err) => {
                warn!(stage = "mailer", error = %err, "notification failed");
                NotificationOutcome::failed(&err)
            }
        }
    }
}
