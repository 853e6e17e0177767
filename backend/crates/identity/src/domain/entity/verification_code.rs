//! Verification Code Entity
//!
//! One-shot codes mailed to users: email confirmation at registration and
//! password reset. A code is deleted the moment it is successfully used;
//! unconsumed codes simply expire and are filtered out on read.

use chrono::{DateTime, Duration, Utc};
use derive_more::Display;

use crate::domain::value_object::ids::{CodeId, UserId};
use platform::crypto::random_token;

/// Length of the random code string embedded in links
const CODE_LENGTH: usize = 25;

/// Email-verification codes are valid for 45 minutes
pub const EMAIL_VERIFICATION_TTL_MINUTES: i64 = 45;

/// Password-reset codes are valid for 1 hour
pub const PASSWORD_RESET_TTL_MINUTES: i64 = 60;

/// What a code is for. A code is only honored for its own purpose.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum CodePurpose {
    #[display("email_verification")]
    EmailVerification,
    #[display("password_reset")]
    PasswordReset,
}

impl CodePurpose {
    pub const fn code(&self) -> &'static str {
        match self {
            CodePurpose::EmailVerification => "email_verification",
            CodePurpose::PasswordReset => "password_reset",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "email_verification" => Some(CodePurpose::EmailVerification),
            "password_reset" => Some(CodePurpose::PasswordReset),
            _ => None,
        }
    }
}

/// Verification code entity
#[derive(Debug, Clone)]
pub struct VerificationCode {
    pub code_id: CodeId,
    pub user_id: UserId,
    pub purpose: CodePurpose,
    /// Random, unguessable, URL-safe
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl VerificationCode {
    /// Issue an email-verification code
    pub fn email_verification(user_id: UserId) -> Self {
        Self::new(
            user_id,
            CodePurpose::EmailVerification,
            Duration::minutes(EMAIL_VERIFICATION_TTL_MINUTES),
        )
    }

    /// Issue a password-reset code
    pub fn password_reset(user_id: UserId) -> Self {
        Self::new(
            user_id,
            CodePurpose::PasswordReset,
            Duration::minutes(PASSWORD_RESET_TTL_MINUTES),
        )
    }

    fn new(user_id: UserId, purpose: CodePurpose, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            code_id: CodeId::new(),
            user_id,
            purpose,
            code: random_token(CODE_LENGTH),
            created_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_is_unguessable_shape() {
        let code = VerificationCode::email_verification(UserId::new());
        assert_eq!(code.code.chars().count(), CODE_LENGTH);

        let other = VerificationCode::email_verification(UserId::new());
        assert_ne!(code.code, other.code);
    }

    #[test]
    fn test_ttls_per_purpose() {
        let verify = VerificationCode::email_verification(UserId::new());
        let reset = VerificationCode::password_reset(UserId::new());

        assert!(verify.expires_at - verify.created_at == Duration::minutes(45));
        assert!(reset.expires_at - reset.created_at == Duration::minutes(60));
    }

    #[test]
    fn test_expiry() {
        let mut code = VerificationCode::password_reset(UserId::new());
        assert!(!code.is_expired());

        code.expires_at = Utc::now() - Duration::seconds(1);
        assert!(code.is_expired());
    }

    #[test]
    fn test_purpose_codes() {
        assert_eq!(CodePurpose::EmailVerification.code(), "email_verification");
        assert_eq!(CodePurpose::PasswordReset.code(), "password_reset");
        assert_eq!(
            CodePurpose::from_code("email_verification"),
            Some(CodePurpose::EmailVerification)
        );
        assert_eq!(
            CodePurpose::from_code("password_reset"),
            Some(CodePurpose::PasswordReset)
        );
        assert_eq!(CodePurpose::from_code("magic_link"), None);
    }
}
