//! Update Role Use Case
//!
//! Role selection: the only place the `pending` role transitions away.
//! Every existing session is revoked and a fresh session + token pair is
//! issued immediately, so no outstanding token carries the old role.

use std::sync::Arc;

use crate::application::config::IdentityConfig;
use crate::application::token::{TokenPair, TokenService};
use crate::domain::entity::{session::Session, user::UserView};
use crate::domain::repository::{SessionRepository, UserRepository};
use crate::domain::value_object::{ids::UserId, user_role::UserRole};
use crate::error::{IdentityError, IdentityResult};

/// Update role output
pub struct UpdateRoleOutput {
    pub user: UserView,
    pub tokens: TokenPair,
}

/// Update role use case
pub struct UpdateRoleUseCase<U, S>
where
    U: UserRepository,
    S: SessionRepository,
{
    user_repo: Arc<U>,
    session_repo: Arc<S>,
    tokens: Arc<TokenService>,
    config: Arc<IdentityConfig>,
}

impl<U, S> UpdateRoleUseCase<U, S>
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

    pub async fn execute(
        &self,
        user_id: &UserId,
        role: &str,
        user_agent: Option<String>,
    ) -> IdentityResult<UpdateRoleOutput> {
        let role = UserRole::from_code(role)
            .filter(UserRole::is_selectable)
            .ok_or_else(|| IdentityError::Validation("Invalid role".to_string()))?;

        let mut user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| IdentityError::not_found("User"))?;

        user.set_role(role);
        self.user_repo.update(&user).await?;

        // Revoke everything issued under the old role, then re-issue
        let revoked = self.session_repo.delete_all_for_user(user_id).await?;

        let session = Session::new(user.user_id, user_agent, self.config.refresh_token_ttl);
        self.session_repo.create(&session).await?;

        let tokens = self
            .tokens
            .issue_pair(&user.user_id, &session.session_id, user.role)?;

        tracing::info!(
            user_id = %user.user_id,
            role = %user.role,
            sessions_revoked = revoked,
            "Role updated, sessions rotated"
        );

        Ok(UpdateRoleOutput {
            user: user.view(),
            tokens,
        })
    }
}
