//! Register Use Case
//!
//! Creates a new user account from credentials and triggers the
//! account-confirmation email.

use std::sync::Arc;

use crate::application::config::IdentityConfig;
use crate::application::mailer::MailSender;
use crate::domain::entity::{user::User, user::UserView, verification_code::VerificationCode};
use crate::domain::repository::{UserRepository, VerificationCodeRepository};
use crate::domain::value_object::{
    email::Email, user_password::RawPassword, user_role::UserRole,
};
use crate::error::{IdentityError, IdentityResult};

/// Register input
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub role: String,
}

/// Register output
pub struct RegisterOutput {
    pub user: UserView,
}

/// Register use case
pub struct RegisterUseCase<U, C, M>
where
    U: UserRepository,
    C: VerificationCodeRepository,
    M: MailSender,
{
    user_repo: Arc<U>,
    code_repo: Arc<C>,
    mailer: Arc<M>,
    config: Arc<IdentityConfig>,
}

impl<U, C, M> RegisterUseCase<U, C, M>
where
    U: UserRepository,
    C: VerificationCodeRepository,
    M: MailSender,
{
    pub fn new(
        user_repo: Arc<U>,
        code_repo: Arc<C>,
        mailer: Arc<M>,
        config: Arc<IdentityConfig>,
    ) -> Self {
        Self {
            user_repo,
            code_repo,
            mailer,
            config,
        }
    }

    pub async fn execute(&self, input: RegisterInput) -> IdentityResult<RegisterOutput> {
        let name = input.name.trim();
        if name.is_empty() || name.chars().count() > 255 {
            return Err(IdentityError::Validation(
                "Name must be between 1 and 255 characters".to_string(),
            ));
        }

        if input.password != input.confirm_password {
            return Err(IdentityError::Validation(
                "Passwords do not match".to_string(),
            ));
        }

        let role = UserRole::from_code(&input.role)
            .filter(UserRole::is_selectable)
            .ok_or_else(|| IdentityError::Validation("Invalid role".to_string()))?;

        let email = Email::new(&input.email)?;

        if self.user_repo.exists_by_email(&email).await? {
            return Err(IdentityError::Conflict(
                "User already exists with this email".to_string(),
            ));
        }

        let password = RawPassword::new(input.password)?;
        let user = User::register(name, email, &password, role, self.config.pepper())?;

        self.user_repo.create(&user).await?;

        // Issue the confirmation code and trigger the email
        let code = VerificationCode::email_verification(user.user_id);
        self.code_repo.create(&code).await?;

        let link = self.config.email_verification_link(&code.code);
        self.mailer
            .send_email_verification(&user.email, &link)
            .await?;

        tracing::info!(
            user_id = %user.user_id,
            role = %user.role,
            "User registered"
        );

        Ok(RegisterOutput { user: user.view() })
    }
}
