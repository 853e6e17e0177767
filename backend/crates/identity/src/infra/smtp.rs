//! SMTP Mailer
//!
//! `MailSender` implementation over lettre's async SMTP transport.
//! Template content is deliberately minimal; rendering is out of scope.

use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::application::mailer::MailSender;
use crate::domain::value_object::email::Email;
use crate::error::{IdentityError, IdentityResult};

/// SMTP-backed mail sender
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl SmtpMailer {
    /// Connect to an SMTP relay with STARTTLS and credentials
    pub fn new(
        host: &str,
        username: String,
        password: String,
        sender: &str,
    ) -> IdentityResult<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|e| IdentityError::Internal(format!("SMTP relay setup failed: {e}")))?
            .credentials(Credentials::new(username, password))
            .build();

        let sender = sender
            .parse()
            .map_err(|e| IdentityError::Internal(format!("Invalid sender mailbox: {e}")))?;

        Ok(Self { transport, sender })
    }

    async fn send(&self, to: &Email, subject: &str, body: String) -> IdentityResult<()> {
        let to: Mailbox = to
            .as_str()
            .parse()
            .map_err(|e| IdentityError::Internal(format!("Invalid recipient mailbox: {e}")))?;

        let message = Message::builder()
            .from(self.sender.clone())
            .to(to)
            .subject(subject)
            .body(body)
            .map_err(|e| IdentityError::Internal(format!("Failed to build email: {e}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| IdentityError::Internal(format!("Failed to send email: {e}")))?;

        Ok(())
    }
}

impl MailSender for SmtpMailer {
    async fn send_email_verification(&self, to: &Email, link: &str) -> IdentityResult<()> {
        tracing::info!(to = %to, "Sending email verification");
        self.send(
            to,
            "Confirm your email address",
            format!("Confirm your Worklane account: {link}"),
        )
        .await
    }

    async fn send_password_reset(&self, to: &Email, link: &str) -> IdentityResult<()> {
        tracing::info!(to = %to, "Sending password reset");
        self.send(
            to,
            "Reset your password",
            format!("Reset your Worklane password: {link}"),
        )
        .await
    }
}
