use std::sync::Arc;
use std::time::Duration;

use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    Message, SmtpTransport, Transport,
};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::app_config::{RelaySettings, SmtpSettings, TlsMode};
use crate::models::contact_models::Notification;

const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("smtp error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
    #[error("relay rejected message: {0}")]
    Rejected(String),
    #[error("relay worker failed: {0}")]
    Worker(String),
}

/// Hands a notification to whatever actually delivers mail. `Ok` means the
/// relay accepted it; nothing beyond that is tracked.
#[cfg_attr(test, mockall::automock)]
pub trait MailRelay: Send + Sync {
    fn deliver(&self, notification: &Notification) -> Result<(), RelayError>;
}

pub fn build_relay(settings: &RelaySettings) -> Result<Arc<dyn MailRelay>, RelayError> {
    match settings {
        RelaySettings::Smtp(smtp) => Ok(Arc::new(SmtpRelay::new(smtp)?)),
        RelaySettings::Log => Ok(Arc::new(LogRelay)),
    }
}

pub fn to_message(notification: &Notification) -> Result<Message, RelayError> {
    let message = Message::builder()
        .from(notification.from.clone())
        .reply_to(Mailbox::new(None, notification.reply_to.clone()))
        .to(notification.to.clone())
        .subject(notification.subject.clone())
        .header(ContentType::TEXT_HTML)
        .body(notification.html_body.clone())?;
    Ok(message)
}

pub struct SmtpRelay {
    transport: SmtpTransport,
}

impl SmtpRelay {
    pub fn new(settings: &SmtpSettings) -> Result<Self, RelayError> {
        let builder = match settings.tls {
            TlsMode::StartTls => SmtpTransport::starttls_relay(&settings.host)?,
            TlsMode::Tls => SmtpTransport::relay(&settings.host)?,
            TlsMode::None => SmtpTransport::builder_dangerous(&settings.host),
        };
        let mut builder = builder.port(settings.port).timeout(Some(SMTP_TIMEOUT));
        if let Some(creds) = &settings.credentials {
            builder = builder.credentials(Credentials::new(
                creds.username.clone(),
                creds.password.clone(),
            ));
        }

        info!(
            host = %settings.host,
            port = settings.port,
            tls = ?settings.tls,
            "SMTP relay configured"
        );
        Ok(Self {
            transport: builder.build(),
        })
    }
}

impl MailRelay for SmtpRelay {
    fn deliver(&self, notification: &Notification) -> Result<(), RelayError> {
        let message = to_message(notification)?;
        let response = self.transport.send(&message)?;
        if !response.is_positive() {
            return Err(RelayError::Rejected(response.code().to_string()));
        }
        debug!(code = %response.code(), "SMTP relay accepted message");
        Ok(())
    }
}

/// Development relay: accepts everything and writes it to the log.
pub struct LogRelay;

impl MailRelay for LogRelay {
    fn deliver(&self, notification: &Notification) -> Result<(), RelayError> {
        info!(
            to = %notification.to,
            reply_to = %notification.reply_to,
            subject = %notification.subject,
            "Contact notification (log relay)"
        );
        debug!(body = %notification.html_body);
        Ok(())
    }
}
