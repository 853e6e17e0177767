//! Logout Use Case
//!
//! Deletes the caller's own session, instantly invalidating any refresh
//! token that references it.

use std::sync::Arc;

use crate::domain::repository::SessionRepository;
use crate::domain::value_object::ids::SessionId;
use crate::error::IdentityResult;

/// Logout use case
pub struct LogoutUseCase<S>
where
    S: SessionRepository,
{
    session_repo: Arc<S>,
}

impl<S> LogoutUseCase<S>
where
    S: SessionRepository,
{
    pub fn new(session_repo: Arc<S>) -> Self {
        Self { session_repo }
    }

    pub async fn execute(&self, session_id: &SessionId) -> IdentityResult<()> {
        self.session_repo.delete(session_id).await?;

        tracing::info!(session_id = %session_id, "User logged out");
        Ok(())
    }
}
