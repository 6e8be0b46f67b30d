use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::debug;

use contact_relay_util::MailConfig;

use crate::transport::{MailTransport, NotificationError, OutgoingMail};

/// SMTP relay client.
///
/// Connects without implicit TLS and upgrades with STARTTLS when the relay
/// offers it.
#[derive(Clone)]
pub struct SmtpRelay {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpRelay {
    /// Builds a relay client from configuration. No connection is opened until the first send.
    pub fn from_config(config: &MailConfig) -> Result<Self, NotificationError> {
        let tls = TlsParameters::builder(config.host.clone())
            .dangerous_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
            .port(config.port)
            .tls(Tls::Opportunistic(tls));
        if let Some(credentials) = &config.credentials {
            builder = builder.credentials(Credentials::new(
                credentials.username.clone(),
                credentials.password.clone(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
        })
    }
}

#[async_trait]
impl MailTransport for SmtpRelay {
    async fn send(&self, mail: OutgoingMail) -> Result<(), NotificationError> {
        let message = build_message(mail)?;
        let response = self.transport.send(message).await?;
        debug!(stage = "mailer", code = %response.code(), "relay accepted message");
        Ok(())
    }
}

/// Converts an [`OutgoingMail`] into a MIME message with an HTML body.
pub fn build_message(mail: OutgoingMail) -> Result<Message, NotificationError> {
    let from_address: Address = mail
        .from
        .parse()
        .map_err(|source| NotificationError::InvalidAddress {
            role: "sender",
            source,
        })?;
    let to: Mailbox = mail
        .to
        .parse()
        .map_err(|source| NotificationError::InvalidAddress {
            role: "recipient",
            source,
        })?;
    let reply_to: Mailbox =
        mail.reply_to
            .parse()
            .map_err(|source| NotificationError::InvalidAddress {
                role: "reply-to",
                source,
            })?;

    let message = Message::builder()
        .from(Mailbox::new(Some(mail.from_name), from_address))
        .to(to)
        .reply_to(reply_to)
        .subject(mail.subject)
        .header(ContentType::TEXT_HTML)
        .body(mail.html)?;
    Ok(message)
}
