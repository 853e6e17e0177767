//! Mail Sender Port
//!
//! The identity flows only *trigger* emails; template content and delivery
//! mechanics live behind this port. The SMTP implementation is in the
//! infrastructure layer.

use crate::domain::value_object::email::Email;
use crate::error::IdentityResult;

/// Outgoing mail port
#[trait_variant::make(MailSender: Send)]
pub trait LocalMailSender {
    /// Send the account-confirmation email carrying `link`
    async fn send_email_verification(&self, to: &Email, link: &str) -> IdentityResult<()>;

    /// Send the password-reset email carrying `link`
    async fn send_password_reset(&self, to: &Email, link: &str) -> IdentityResult<()>;
}
