pub mod notifier;
pub mod smtp;
pub mod template;
pub mod transport;

pub use notifier::{MailEnvelope, NotificationOutcome, Notifier};
pub use smtp::SmtpRelay;
pub use transport::{DisabledTransport, MailTransport, NotificationError, OutgoingMail};
