//! Login Use Case
//!
//! Verifies credentials. When the user has MFA enabled no tokens are
//! issued; the login stays deferred until the MFA verification flow
//! completes it. Otherwise a session is created and a token pair minted.

use std::sync::Arc;

use crate::application::config::IdentityConfig;
use crate::application::token::{TokenPair, TokenService};
use crate::domain::entity::{session::Session, user::UserView};
use crate::domain::repository::{SessionRepository, UserRepository};
use crate::domain::value_object::{email::Email, user_password::RawPassword};
use crate::error::{IdentityError, IdentityResult};

/// Login input
pub struct LoginInput {
    pub email: String,
    pub password: String,
    /// Opaque client description stored on the session
    pub user_agent: Option<String>,
}

/// Login output
#[derive(Debug)]
pub struct LoginOutput {
    pub user: UserView,
    /// True when token issuance was deferred pending MFA verification
    pub mfa_required: bool,
    /// Present only when `mfa_required` is false
    pub tokens: Option<TokenPair>,
}

/// Login use case
pub struct LoginUseCase<U, S>
where
    U: UserRepository,
    S: SessionRepository,
{
    user_repo: Arc<U>,
    session_repo: Arc<S>,
    tokens: Arc<TokenService>,
    config: Arc<IdentityConfig>,
}

impl<U, S> LoginUseCase<U, S>
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

    pub async fn execute(&self, input: LoginInput) -> IdentityResult<LoginOutput> {
        // Any malformed or unknown email reports exactly like a bad
        // password: no enumeration signal.
        let email = Email::new(&input.email).map_err(|_| IdentityError::InvalidCredentials)?;

        let user = self
            .user_repo
            .find_by_email(&email)
            .await?
            .ok_or(IdentityError::InvalidCredentials)?;

        let password =
            RawPassword::new(input.password).map_err(|_| IdentityError::InvalidCredentials)?;

        if !user.verify_password(&password, self.config.pepper()) {
            return Err(IdentityError::InvalidCredentials);
        }

        if user.mfa.enabled {
            tracing::info!(user_id = %user.user_id, "Login deferred pending MFA");
            return Ok(LoginOutput {
                user: user.view(),
                mfa_required: true,
                tokens: None,
            });
        }

        let session = Session::new(user.user_id, input.user_agent, self.config.refresh_token_ttl);
        self.session_repo.create(&session).await?;

        let tokens = self
            .tokens
            .issue_pair(&user.user_id, &session.session_id, user.role)?;

        tracing::info!(
            user_id = %user.user_id,
            session_id = %session.session_id,
            "User logged in"
        );

        Ok(LoginOutput {
            user: user.view(),
            mfa_required: false,
            tokens: Some(tokens),
        })
    }
}
