//! Password Reset Use Case
//!
//! Two halves of one flow:
//! - `forgot`: rate-limited issuance of a reset code, delivered by email.
//! - `reset`: consume the code, replace the credential, and revoke every
//!   session the user has - a reset must force re-authentication
//!   everywhere.

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::application::config::IdentityConfig;
use crate::application::mailer::MailSender;
use crate::domain::entity::verification_code::{CodePurpose, VerificationCode};
use crate::domain::repository::{SessionRepository, UserRepository, VerificationCodeRepository};
use crate::domain::value_object::{
    email::Email,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{IdentityError, IdentityResult};

/// Password reset use case
pub struct PasswordResetUseCase<U, S, C, M>
where
    U: UserRepository,
    S: SessionRepository,
    C: VerificationCodeRepository,
    M: MailSender,
{
    user_repo: Arc<U>,
    session_repo: Arc<S>,
    code_repo: Arc<C>,
    mailer: Arc<M>,
    config: Arc<IdentityConfig>,
}

impl<U, S, C, M> PasswordResetUseCase<U, S, C, M>
where
    U: UserRepository,
    S: SessionRepository,
    C: VerificationCodeRepository,
    M: MailSender,
{
    pub fn new(
        user_repo: Arc<U>,
        session_repo: Arc<S>,
        code_repo: Arc<C>,
        mailer: Arc<M>,
        config: Arc<IdentityConfig>,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            code_repo,
            mailer,
            config,
        }
    }

    /// Issue a reset code and trigger the reset email.
    ///
    /// At most `reset_rate_limit.max_requests` codes may be issued per user
    /// inside the rolling window; beyond that the request fails terminally
    /// with `RateLimited`.
    pub async fn forgot(&self, email: &str) -> IdentityResult<()> {
        let email = Email::new(email)?;

        let user = self
            .user_repo
            .find_by_email(&email)
            .await?
            .ok_or_else(|| IdentityError::not_found("User"))?;

        let limit = &self.config.reset_rate_limit;
        let window_start = Utc::now()
            - Duration::milliseconds(limit.window_ms());

        let recent = self
            .code_repo
            .count_recent(&user.user_id, CodePurpose::PasswordReset, window_start)
            .await?;

        let decision = limit.check(recent as u32, window_start.timestamp_millis());
        if !decision.allowed {
            tracing::warn!(user_id = %user.user_id, "Password reset rate limit exceeded");
            return Err(IdentityError::RateLimited);
        }

        let code = VerificationCode::password_reset(user.user_id);
        self.code_repo.create(&code).await?;

        let link = self
            .config
            .password_reset_link(&code.code, code.expires_at.timestamp_millis());
        self.mailer.send_password_reset(&user.email, &link).await?;

        tracing::info!(user_id = %user.user_id, "Password reset code issued");
        Ok(())
    }

    /// Consume a reset code and replace the credential. All of the user's
    /// sessions are deleted, so pre-reset refresh tokens die with them.
    pub async fn reset(&self, code: &str, new_password: String) -> IdentityResult<()> {
        let code = self
            .code_repo
            .find_valid(code, CodePurpose::PasswordReset)
            .await?
            .ok_or_else(|| IdentityError::not_found("Verification code"))?;

        let password = RawPassword::new(new_password)?;
        let hash = UserPassword::from_raw(&password, self.config.pepper())?;

        let mut user = self
            .user_repo
            .find_by_id(&code.user_id)
            .await?
            .ok_or_else(|| IdentityError::not_found("User"))?;

        user.set_password(hash);
        self.user_repo.update(&user).await?;

        self.code_repo.delete(&code.code_id).await?;

        let revoked = self
            .session_repo
            .delete_all_for_user(&user.user_id)
            .await?;

        tracing::info!(
            user_id = %user.user_id,
            sessions_revoked = revoked,
            "Password reset completed"
        );

        Ok(())
    }
}
