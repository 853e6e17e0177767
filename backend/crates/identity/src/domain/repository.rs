//! Repository Traits
//!
//! Interfaces for data persistence. Implementations live in the
//! infrastructure layer. All operations are single-record; there are no
//! multi-record transactions, so composite flows are not atomic (see the
//! concurrency notes in DESIGN.md).

use chrono::{DateTime, Utc};

use crate::domain::entity::{
    session::Session,
    user::User,
    verification_code::{CodePurpose, VerificationCode},
};
use crate::domain::value_object::{
    email::Email,
    ids::{CodeId, SessionId, UserId},
    provider_link::OAuthProvider,
};
use crate::error::IdentityResult;

/// User repository trait
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Create a new user
    async fn create(&self, user: &User) -> IdentityResult<()>;

    /// Find user by ID
    async fn find_by_id(&self, user_id: &UserId) -> IdentityResult<Option<User>>;

    /// Find user by email (case-insensitive via Email normalization)
    async fn find_by_email(&self, email: &Email) -> IdentityResult<Option<User>>;

    /// Check if email exists
    async fn exists_by_email(&self, email: &Email) -> IdentityResult<bool>;

    /// Find the user carrying an exact `(provider, provider_id)` link
    async fn find_by_provider(
        &self,
        provider: OAuthProvider,
        provider_id: &str,
    ) -> IdentityResult<Option<User>>;

    /// Update user (role, flags, MFA settings, provider links, password)
    async fn update(&self, user: &User) -> IdentityResult<()>;
}

/// Session repository trait
#[trait_variant::make(SessionRepository: Send)]
pub trait LocalSessionRepository {
    /// Create a new session
    async fn create(&self, session: &Session) -> IdentityResult<()>;

    /// Find session by ID. Returns the record even when past expiry;
    /// callers enforce expiry lazily on read.
    async fn find_by_id(&self, session_id: &SessionId) -> IdentityResult<Option<Session>>;

    /// Update session (expiry extension on the rotation path)
    async fn update(&self, session: &Session) -> IdentityResult<()>;

    /// Delete a session
    async fn delete(&self, session_id: &SessionId) -> IdentityResult<()>;

    /// Delete all sessions for a user
    async fn delete_all_for_user(&self, user_id: &UserId) -> IdentityResult<u64>;

    /// Clean up expired sessions
    async fn cleanup_expired(&self) -> IdentityResult<u64>;
}

/// Verification code repository trait
#[trait_variant::make(VerificationCodeRepository: Send)]
pub trait LocalVerificationCodeRepository {
    /// Create a new code
    async fn create(&self, code: &VerificationCode) -> IdentityResult<()>;

    /// Find an unexpired code by its value and purpose
    async fn find_valid(
        &self,
        code: &str,
        purpose: CodePurpose,
    ) -> IdentityResult<Option<VerificationCode>>;

    /// Count codes issued to a user since `since` (reset rate limit)
    async fn count_recent(
        &self,
        user_id: &UserId,
        purpose: CodePurpose,
        since: DateTime<Utc>,
    ) -> IdentityResult<u64>;

    /// Delete (consume) a code
    async fn delete(&self, code_id: &CodeId) -> IdentityResult<()>;

    /// Clean up expired codes
    async fn cleanup_expired(&self) -> IdentityResult<u64>;
}
