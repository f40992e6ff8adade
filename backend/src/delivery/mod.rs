//! # Certificate Delivery
//!
//! Emails rendered certificates to their recipients.
//!
//! - [`DeliveryService`] sends one message. Inputs are validated before the
//!   transport is touched, and the attachment is read from disk at send time.
//! - [`DeliveryOrchestrator`] walks a [`DeliveryIndex`](common::model::delivery::DeliveryIndex)
//!   in order, pacing attempts and recording an outcome per recipient.
//! - [`MailTransport`] is the seam to the outside world. [`SmtpMailer`] is the real
//!   implementation and opens one implicit-TLS session per call.

mod address;
mod orchestrator;
mod service;

pub use address::is_valid_email;
pub use orchestrator::{AttachmentSource, DeliveryOrchestrator};
pub use service::{DeliveryService, MailAttachment, MailTransport, OutgoingMessage, SmtpMailer};
pub(crate) use service::validate_credentials;

use std::fmt;
use std::time::Duration;

/// Where and how the SMTP session is opened.
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    /// Implicit TLS port.
    pub port: u16,
    pub timeout: Duration,
}

impl Default for SmtpSettings {
    fn default() -> Self {
        Self {
            host: "smtp.gmail.com".to_string(),
            port: 465,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Sender account. Held in memory only.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub address: String,
    pub password: String,
}

impl Credentials {
    pub fn new(address: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("address", &self.address)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Subject and body shared by every message of a send pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate {
    pub subject: String,
    pub body: String,
}

impl MessageTemplate {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }
}

/// Used by a retry pass when no send pass has run in the session yet.
impl Default for MessageTemplate {
    fn default() -> Self {
        Self::new("Your Certificate", "Please find your certificate attached.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_never_shows_in_debug_output() {
        let creds = Credentials::new("me@example.com", "hunter2");
        let printed = format!("{:?}", creds);
        assert!(printed.contains("me@example.com"));
        assert!(!printed.contains("hunter2"));
    }

    #[test]
    fn default_message_is_the_retry_fallback() {
        let message = MessageTemplate::default();
        assert_eq!(message.subject, "Your Certificate");
        assert_eq!(message.body, "Please find your certificate attached.");
    }
}
