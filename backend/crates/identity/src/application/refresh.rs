//! Refresh Use Case
//!
//! Sliding-window refresh rotation:
//! 1. Verify the refresh token (signature, expiry, audience).
//! 2. Load the referenced session; reject when missing or expired.
//! 3. When remaining session validity is at or below the rotation
//!    threshold, extend the session by the full refresh TTL and issue a
//!    new refresh token alongside the access token.
//! 4. Otherwise issue only a new access token; the existing refresh token
//!    stays valid until its own expiry.
//!
//! The new access token always carries the user's *current* role - the
//! refresh token itself never holds one.

use std::sync::Arc;

use crate::application::config::IdentityConfig;
use crate::application::token::TokenService;
use crate::domain::repository::{SessionRepository, UserRepository};
use crate::error::{IdentityError, IdentityResult};

/// Refresh output
pub struct RefreshOutput {
    pub access_token: String,
    /// Present only when the rotation threshold was reached
    pub refresh_token: Option<String>,
}

/// Refresh use case
pub struct RefreshUseCase<U, S>
where
    U: UserRepository,
    S: SessionRepository,
{
    user_repo: Arc<U>,
    session_repo: Arc<S>,
    tokens: Arc<TokenService>,
    config: Arc<IdentityConfig>,
}

impl<U, S> RefreshUseCase<U, S>
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

    pub async fn execute(&self, refresh_token: &str) -> IdentityResult<RefreshOutput> {
        let claims = self.tokens.verify_refresh(refresh_token)?;
        let session_id = claims.session_id()?;

        let mut session = self
            .session_repo
            .find_by_id(&session_id)
            .await?
            .ok_or_else(|| IdentityError::not_found("Session"))?;

        if session.is_expired() {
            return Err(IdentityError::SessionExpired);
        }

        let new_refresh_token = if session.needs_rotation(self.config.rotation_threshold) {
            session.extend(self.config.refresh_token_ttl);
            self.session_repo.update(&session).await?;

            tracing::debug!(
                session_id = %session.session_id,
                "Session extended, refresh token rotated"
            );

            Some(self.tokens.issue_refresh(&session.session_id)?)
        } else {
            None
        };

        // One user read so the fresh access token reflects the current role
        let user = self
            .user_repo
            .find_by_id(&session.user_id)
            .await?
            .ok_or_else(|| IdentityError::not_found("User"))?;

        let access_token =
            self.tokens
                .issue_access(&user.user_id, &session.session_id, user.role)?;

        Ok(RefreshOutput {
            access_token,
            refresh_token: new_refresh_token,
        })
    }
}
