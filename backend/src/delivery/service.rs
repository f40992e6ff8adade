use crate::delivery::{is_valid_email, Credentials, SmtpSettings};
use crate::error::DeliveryError;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials as SmtpCredentials;
use lettre::{Message, SmtpTransport, Transport};
use log::{debug, info, warn};
use std::fs;
use std::path::Path;

/// A file attached to an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailAttachment {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// A validated message, ready for a [`MailTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
    pub attachment: Option<MailAttachment>,
}

/// Opens a session with the mail server and submits messages.
pub trait MailTransport: Send + Sync {
    /// Connects and authenticates without sending anything.
    fn test_connection(&self, credentials: &Credentials) -> Result<(), DeliveryError>;

    fn submit(&self, credentials: &Credentials, message: &OutgoingMessage) -> Result<(), DeliveryError>;
}

/// Validates and sends single messages through a [`MailTransport`].
#[derive(Debug, Clone)]
pub struct DeliveryService<T> {
    transport: T,
}

impl<T: MailTransport> DeliveryService<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn test_connection(&self, credentials: &Credentials) -> Result<(), DeliveryError> {
        validate_credentials(credentials)?;
        self.transport.test_connection(credentials)?;
        info!("SMTP login succeeded for {}", credentials.address.trim());
        Ok(())
    }

    /// Sends one message. A missing attachment file is logged and the message goes
    /// out without it.
    pub fn send(
        &self,
        credentials: &Credentials,
        recipient: &str,
        subject: &str,
        body: &str,
        attachment: Option<&Path>,
    ) -> Result<(), DeliveryError> {
        validate_credentials(credentials)?;
        let recipient = recipient.trim();
        if !is_valid_email(recipient) {
            return Err(DeliveryError::Validation(format!(
                "invalid recipient address: '{}'",
                recipient
            )));
        }

        let message = OutgoingMessage {
            from: credentials.address.trim().to_string(),
            to: recipient.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
            attachment: attachment.and_then(load_attachment),
        };
        self.transport.submit(credentials, &message)?;
        debug!("Sent certificate to {}", recipient);
        Ok(())
    }
}

pub(crate) fn validate_credentials(credentials: &Credentials) -> Result<(), DeliveryError> {
    let address = credentials.address.trim();
    if address.is_empty() {
        return Err(DeliveryError::Validation("sender address is required".to_string()));
    }
    if credentials.password.is_empty() {
        return Err(DeliveryError::Validation("sender password is required".to_string()));
    }
    if !is_valid_email(address) {
        return Err(DeliveryError::Validation(format!(
            "invalid sender address: '{}'",
            address
        )));
    }
    Ok(())
}

fn load_attachment(path: &Path) -> Option<MailAttachment> {
    match fs::read(path) {
        Ok(bytes) => {
            let filename = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("certificate.png")
                .to_string();
            let content_type = mime_guess::from_path(path)
                .first_or_octet_stream()
                .to_string();
            Some(MailAttachment {
                filename,
                content_type,
                bytes,
            })
        }
        Err(e) => {
            warn!(
                "Attachment {} unavailable ({}), sending without it",
                path.display(),
                e
            );
            None
        }
    }
}

/// SMTP over implicit TLS with `lettre`. Every call opens a fresh session.
#[derive(Debug, Clone)]
pub struct SmtpMailer {
    settings: SmtpSettings,
}

impl SmtpMailer {
    pub fn new(settings: SmtpSettings) -> Self {
        Self { settings }
    }

    fn connect(&self, credentials: &Credentials) -> Result<SmtpTransport, DeliveryError> {
        let transport = SmtpTransport::relay(&self.settings.host)
            .map_err(|e| DeliveryError::Transport(e.to_string()))?
            .port(self.settings.port)
            .credentials(SmtpCredentials::new(
                credentials.address.trim().to_string(),
                credentials.password.clone(),
            ))
            .timeout(Some(self.settings.timeout))
            .build();
        Ok(transport)
    }
}

impl MailTransport for SmtpMailer {
    fn test_connection(&self, credentials: &Credentials) -> Result<(), DeliveryError> {
        let transport = self.connect(credentials)?;
        match transport.test_connection() {
            Ok(true) => Ok(()),
            Ok(false) => Err(DeliveryError::Transport(format!(
                "could not connect to {}:{}",
                self.settings.host, self.settings.port
            ))),
            Err(e) => Err(classify_smtp_error(e)),
        }
    }

    fn submit(&self, credentials: &Credentials, message: &OutgoingMessage) -> Result<(), DeliveryError> {
        let email = build_message(message)?;
        let transport = self.connect(credentials)?;
        transport.send(&email).map_err(classify_smtp_error)?;
        Ok(())
    }
}

fn build_message(message: &OutgoingMessage) -> Result<Message, DeliveryError> {
    let from: Mailbox = message
        .from
        .parse()
        .map_err(|e| DeliveryError::Validation(format!("invalid sender address: {}", e)))?;
    let to: Mailbox = message
        .to
        .parse()
        .map_err(|e| DeliveryError::Validation(format!("invalid recipient address: {}", e)))?;

    let mut parts = MultiPart::mixed().singlepart(SinglePart::plain(message.body.clone()));
    if let Some(attachment) = &message.attachment {
        let content_type = ContentType::parse(&attachment.content_type).map_err(|e| {
            DeliveryError::Validation(format!("attachment content type: {}", e))
        })?;
        parts = parts.singlepart(
            Attachment::new(attachment.filename.clone()).body(attachment.bytes.clone(), content_type),
        );
    }

    Message::builder()
        .from(from)
        .to(to)
        .subject(message.subject.clone())
        .multipart(parts)
        .map_err(|e| DeliveryError::Validation(format!("message could not be built: {}", e)))
}

/// SMTP 530/534/535 replies mean the credentials were refused.
fn classify_smtp_error(error: lettre::transport::smtp::Error) -> DeliveryError {
    let code = error.status().map(|code| code.to_string());
    match code.as_deref() {
        Some("530") | Some("534") | Some("535") => DeliveryError::Auth(error.to_string()),
        _ => DeliveryError::Transport(error.to_string()),
    }
}
