//! Outbound email for verification and password-reset codes.
//!
//! Two backends behind one trait: `smtp` delivers through a lettre
//! `AsyncSmtpTransport`, `console` logs the message instead (development
//! default). `MemoryMailer` captures messages for tests.

use async_trait::async_trait;
use lettre::{
    message::header::ContentType,
    message::Mailbox,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::info;

use crate::config::EmailConfig;

#[derive(Debug, Error)]
pub enum MailerError {
    #[error("Invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), MailerError>;
}

/// Delivers through an SMTP relay (STARTTLS)
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(cfg: &EmailConfig) -> Result<Self, MailerError> {
        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.smtp_host)?
                .port(cfg.smtp_port);

        if let (Some(username), Some(password)) = (&cfg.smtp_username, &cfg.smtp_password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from: cfg.from_email.parse()?,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), MailerError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(recipient.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;

        self.transport.send(message).await?;
        Ok(())
    }
}

/// Logs the message instead of delivering it
pub struct ConsoleMailer;

#[async_trait]
impl Mailer for ConsoleMailer {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), MailerError> {
        info!(recipient, subject, "console mailer:\n{}", body);
        Ok(())
    }
}

/// A sent message captured by [`MemoryMailer`]
#[derive(Debug, Clone)]
pub struct OutboundEmail {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// Stores messages in memory so tests can assert on them
#[derive(Default, Clone)]
pub struct MemoryMailer {
    pub sent: Arc<Mutex<Vec<OutboundEmail>>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<OutboundEmail> {
        self.sent.lock().expect("mailer lock poisoned").clone()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), MailerError> {
        self.sent
            .lock()
            .expect("mailer lock poisoned")
            .push(OutboundEmail {
                recipient: recipient.to_string(),
                subject: subject.to_string(),
                body: body.to_string(),
            });
        Ok(())
    }
}

/// Builds the configured backend
pub fn build_mailer(cfg: &EmailConfig) -> Result<Arc<dyn Mailer>, MailerError> {
    match cfg.backend.to_ascii_lowercase().as_str() {
        "smtp" => Ok(Arc::new(SmtpMailer::new(cfg)?)),
        _ => Ok(Arc::new(ConsoleMailer)),
    }
}

pub const VERIFICATION_SUBJECT: &str = "Verify Your Email Address";
pub const PASSWORD_RESET_SUBJECT: &str = "Password Reset Code";

/// Body of the verification email. The stated 15-minute window is informative
/// only; codes stay valid until verified or overwritten by a resend.
pub fn verification_body(full_name: &str, code: &str) -> String {
    format!(
        "Hello {full_name},\n\n\
         Thank you for registering! Your verification code is:\n\n\
         {code}\n\n\
         Please enter this code to verify your email address.\n\n\
         This code will expire in 15 minutes.\n\n\
         If you didn't register for an account, please ignore this email.\n\n\
         Best regards,\n\
         The Laundromat Team"
    )
}

pub fn password_reset_body(code: &str) -> String {
    format!(
        "Your password reset code is: {code}\n\n\
         If you did not request this, please ignore this email."
    )
}
