//! MFA Use Case
//!
//! TOTP enrollment lifecycle (`NotEnrolled -> PendingSecret -> Enrolled`,
//! plus revoke back to `NotEnrolled`) and the login-time verification that
//! completes a deferred password login.

use std::sync::Arc;

use crate::application::config::IdentityConfig;
use crate::application::token::{TokenPair, TokenService};
use crate::domain::entity::{session::Session, user::UserView};
use crate::domain::repository::{SessionRepository, UserRepository};
use crate::domain::value_object::{email::Email, ids::UserId, totp_secret::TotpSecret};
use crate::error::{IdentityError, IdentityResult};

/// Result of a setup request
pub enum MfaSetupOutput {
    /// Enrollment already confirmed; calling setup again changes nothing
    AlreadyEnabled,
    /// Pending secret to scan or type into an authenticator app.
    /// Calling setup again before confirming returns the same secret.
    Setup {
        secret: String,
        qr_image_base64: String,
        otpauth_url: String,
    },
}

/// Result of a revoke request
pub enum MfaRevokeOutput {
    /// MFA was not enabled; nothing to do
    NotEnabled,
    Revoked,
}

/// Output of login-time MFA verification: the tail of a normal login
pub struct MfaLoginOutput {
    pub user: UserView,
    pub tokens: TokenPair,
}

/// MFA use case
pub struct MfaUseCase<U, S>
where
    U: UserRepository,
    S: SessionRepository,
{
    user_repo: Arc<U>,
    session_repo: Arc<S>,
    tokens: Arc<TokenService>,
    config: Arc<IdentityConfig>,
}

impl<U, S> MfaUseCase<U, S>
where
    U: UserRepository,
    S: SessionRepository,
{
    pub fn new(
        user_repo: Arc<U>,
        session_repo: Arc<S>,
        tokens: Arc<TokenService>,
        config: Arc<IdentityConfig>,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            tokens,
            config,
        }
    }

    /// Start (or re-show) enrollment for the authenticated user.
    ///
    /// Idempotent: an already-enabled user gets an informational result,
    /// and repeated calls before confirmation return the same secret.
    pub async fn generate_setup(&self, user_id: &UserId) -> IdentityResult<MfaSetupOutput> {
        let mut user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| IdentityError::not_found("User"))?;

        if user.mfa.enabled {
            return Ok(MfaSetupOutput::AlreadyEnabled);
        }

        let secret = user.begin_mfa_enrollment();
        self.user_repo.update(&user).await?;

        let account_name = user.email.as_str();
        let qr_image_base64 = secret.generate_qr_code(account_name)?;
        let otpauth_url = secret.get_otpauth_url(account_name)?;

        tracing::info!(user_id = %user.user_id, "MFA setup initiated");

        Ok(MfaSetupOutput::Setup {
            secret: secret.as_base32().to_string(),
            qr_image_base64,
            otpauth_url,
        })
    }

    /// Confirm enrollment by proving possession of the secret.
    ///
    /// The code is validated against the secret echoed back from the setup
    /// step. On failure the state is left unchanged; there is no lockout
    /// counter.
    pub async fn verify_setup(
        &self,
        user_id: &UserId,
        code: &str,
        secret: &str,
    ) -> IdentityResult<()> {
        let mut user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| IdentityError::not_found("User"))?;

        if user.mfa.enabled {
            // Already confirmed; nothing to verify
            return Ok(());
        }

        let secret = TotpSecret::from_base32(secret)
            .map_err(|_| IdentityError::Validation("Invalid MFA secret".to_string()))?;

        let valid = secret.verify(code, user.email.as_str())?;
        if !valid {
            return Err(IdentityError::InvalidMfaCode);
        }

        user.confirm_mfa_enrollment();
        self.user_repo.update(&user).await?;

        tracing::info!(user_id = %user.user_id, "MFA enabled");
        Ok(())
    }

    /// Disenroll. Idempotent no-op when MFA is not enabled.
    pub async fn revoke(&self, user_id: &UserId) -> IdentityResult<MfaRevokeOutput> {
        let mut user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| IdentityError::not_found("User"))?;

        if !user.mfa.enabled {
            return Ok(MfaRevokeOutput::NotEnabled);
        }

        user.revoke_mfa();
        self.user_repo.update(&user).await?;

        tracing::info!(user_id = %user.user_id, "MFA revoked");
        Ok(MfaRevokeOutput::Revoked)
    }

    /// Complete a deferred login.
    ///
    /// Looked up by email because the caller is not authenticated yet.
    /// On success this is exactly the tail of a normal login: create a
    /// session, issue the token pair.
    pub async fn verify_for_login(
        &self,
        code: &str,
        email: &str,
        user_agent: Option<String>,
    ) -> IdentityResult<MfaLoginOutput> {
        let email = Email::new(email)?;

        let user = self
            .user_repo
            .find_by_email(&email)
            .await?
            .ok_or_else(|| IdentityError::not_found("User"))?;

        if !user.mfa.enabled && user.mfa.secret.is_none() {
            return Err(IdentityError::MfaNotEnrolled);
        }

        let secret = user
            .mfa
            .secret
            .as_ref()
            .ok_or(IdentityError::MfaNotEnrolled)?;

        let valid = secret.verify(code, user.email.as_str())?;
        if !valid {
            return Err(IdentityError::InvalidMfaCode);
        }

        let session = Session::new(user.user_id, user_agent, self.config.refresh_token_ttl);
        self.session_repo.create(&session).await?;

        let tokens = self
            .tokens
            .issue_pair(&user.user_id, &session.session_id, user.role)?;

        tracing::info!(
            user_id = %user.user_id,
            session_id = %session.session_id,
            "MFA login completed"
        );

        Ok(MfaLoginOutput {
            user: user.view(),
            tokens,
        })
    }
}
