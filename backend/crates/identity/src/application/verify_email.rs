//! Verify Email Use Case
//!
//! Consumes an unexpired email-verification code and marks the owning
//! user's email as verified. The code is deleted on success; unconsumed
//! codes just expire.

use std::sync::Arc;

use crate::domain::entity::{user::UserView, verification_code::CodePurpose};
use crate::domain::repository::{UserRepository, VerificationCodeRepository};
use crate::error::{IdentityError, IdentityResult};

/// Verify email output
pub struct VerifyEmailOutput {
    pub user: UserView,
}

/// Verify email use case
pub struct VerifyEmailUseCase<U, C>
where
    U: UserRepository,
    C: VerificationCodeRepository,
{
    user_repo: Arc<U>,
    code_repo: Arc<C>,
}

impl<U, C> VerifyEmailUseCase<U, C>
where
    U: UserRepository,
    C: VerificationCodeRepository,
{
    pub fn new(user_repo: Arc<U>, code_repo: Arc<C>) -> Self {
        Self {
            user_repo,
            code_repo,
        }
    }

    pub async fn execute(&self, code: &str) -> IdentityResult<VerifyEmailOutput> {
        let code = self
            .code_repo
            .find_valid(code, CodePurpose::EmailVerification)
            .await?
            .ok_or_else(|| IdentityError::not_found("Verification code"))?;

        let mut user = self
            .user_repo
            .find_by_id(&code.user_id)
            .await?
            .ok_or_else(|| IdentityError::not_found("User"))?;

        user.mark_email_verified();
        self.user_repo.update(&user).await?;

        // Consume the code only after the user record is updated
        self.code_repo.delete(&code.code_id).await?;

        tracing::info!(user_id = %user.user_id, "Email verified");

        Ok(VerifyEmailOutput { user: user.view() })
    }
}
