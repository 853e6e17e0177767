//! Link Identity Use Case
//!
//! Merge-or-create resolution for an asserted external identity:
//! 1. A user already carrying the exact `(provider, provider_id)` pair wins.
//! 2. Otherwise a user with the asserted email gains the link - the
//!    provider's email claim is treated as proof of ownership of the local
//!    account, with no extra confirmation step.
//! 3. Otherwise a new account is created: role pending, email trusted as
//!    verified, random placeholder credential.
//!
//! All three branches end with a fresh session and a token pair. MFA is
//! not consulted on this path (unlike password login, which defers).

use std::sync::Arc;

use crate::application::config::IdentityConfig;
use crate::application::token::{TokenPair, TokenService};
use crate::domain::entity::{session::Session, user::User, user::UserView};
use crate::domain::repository::{SessionRepository, UserRepository};
use crate::domain::value_object::{email::Email, provider_link::OAuthProvider};
use crate::error::{IdentityError, IdentityResult};

/// Normalized identity assertion from a provider callback
#[derive(Debug, Clone)]
pub struct ProviderIdentity {
    pub provider: OAuthProvider,
    pub provider_id: String,
    pub email: String,
    pub display_name: Option<String>,
}

/// Link identity output
pub struct LinkIdentityOutput {
    pub user: UserView,
    pub tokens: TokenPair,
}

/// Link identity use case
pub struct LinkIdentityUseCase<U, S>
where
    U: UserRepository,
    S: SessionRepository,
{
    user_repo: Arc<U>,
    session_repo: Arc<S>,
    tokens: Arc<TokenService>,
    config: Arc<IdentityConfig>,
}

impl<U, S> LinkIdentityUseCase<U, S>
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

    pub async fn resolve(
        &self,
        identity: ProviderIdentity,
        user_agent: Option<String>,
    ) -> IdentityResult<LinkIdentityOutput> {
        let email = Email::new(&identity.email).map_err(|_| {
            IdentityError::Validation("Identity provider did not supply a usable email".to_string())
        })?;

        let user = self.find_or_create(&identity, email).await?;

        let session = Session::new(user.user_id, user_agent, self.config.refresh_token_ttl);
        self.session_repo.create(&session).await?;

        let tokens = self
            .tokens
            .issue_pair(&user.user_id, &session.session_id, user.role)?;

        tracing::info!(
            user_id = %user.user_id,
            provider = %identity.provider,
            session_id = %session.session_id,
            "OAuth login resolved"
        );

        Ok(LinkIdentityOutput {
            user: user.view(),
            tokens,
        })
    }

    async fn find_or_create(
        &self,
        identity: &ProviderIdentity,
        email: Email,
    ) -> IdentityResult<User> {
        // 1) Exact provider pair
        if let Some(user) = self
            .user_repo
            .find_by_provider(identity.provider, &identity.provider_id)
            .await?
        {
            return Ok(user);
        }

        // 2) Email fallback: link the asserted identity to the local account
        if let Some(mut user) = self.user_repo.find_by_email(&email).await? {
            if user.link_provider(identity.provider, &identity.provider_id) {
                self.user_repo.update(&user).await?;
                tracing::info!(
                    user_id = %user.user_id,
                    provider = %identity.provider,
                    "Provider linked to existing account"
                );
            }
            return Ok(user);
        }

        // 3) Brand-new identity. No uniqueness constraint spans the
        // provider pair across users, so two racing callbacks can both
        // land here; only email carries a constraint.
        let name = identity
            .display_name
            .clone()
            .unwrap_or_else(|| "Unnamed".to_string());

        let user = User::from_provider(
            name,
            email,
            identity.provider,
            identity.provider_id.clone(),
            self.config.pepper(),
        )?;

        self.user_repo.create(&user).await?;

        tracing::info!(
            user_id = %user.user_id,
            provider = %identity.provider,
            "Account created from provider identity"
        );

        Ok(user)
    }
}
