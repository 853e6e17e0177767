//! In-Memory Repository Implementations
//!
//! Simple repositories backed by `RwLock`ed vectors, used by the use-case
//! tests and handy for local experiments. Clones share state.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};

use crate::application::mailer::MailSender;
use crate::domain::entity::{
    session::Session,
    user::User,
    verification_code::{CodePurpose, VerificationCode},
};
use crate::domain::repository::{SessionRepository, UserRepository, VerificationCodeRepository};
use crate::domain::value_object::{
    email::Email,
    ids::{CodeId, SessionId, UserId},
    provider_link::OAuthProvider,
};
use crate::error::IdentityResult;

/// In-memory identity repository
#[derive(Clone, Default)]
pub struct InMemoryIdentityRepository {
    users: Arc<RwLock<Vec<User>>>,
    sessions: Arc<RwLock<Vec<Session>>>,
    codes: Arc<RwLock<Vec<VerificationCode>>>,
}

impl InMemoryIdentityRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Direct session insert for tests that need a hand-crafted expiry
    pub fn insert_session(&self, session: Session) {
        self.sessions.write().unwrap().push(session);
    }

    /// Number of live (unexpired) sessions for a user
    pub fn session_count(&self, user_id: &UserId) -> usize {
        self.sessions
            .read()
            .unwrap()
            .iter()
            .filter(|s| &s.user_id == user_id && !s.is_expired())
            .count()
    }

    /// Number of users in the store
    pub fn user_count(&self) -> usize {
        self.users.read().unwrap().len()
    }

    /// Most recent code issued to a user for a purpose
    pub fn latest_code(&self, user_id: &UserId, purpose: CodePurpose) -> Option<VerificationCode> {
        self.codes
            .read()
            .unwrap()
            .iter()
            .filter(|c| &c.user_id == user_id && c.purpose == purpose)
            .max_by_key(|c| c.created_at)
            .cloned()
    }
}

impl UserRepository for InMemoryIdentityRepository {
    async fn create(&self, user: &User) -> IdentityResult<()> {
        self.users.write().unwrap().push(user.clone());
        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> IdentityResult<Option<User>> {
        Ok(self
            .users
            .read()
            .unwrap()
            .iter()
            .find(|u| &u.user_id == user_id)
            .cloned())
    }

    async fn find_by_email(&self, email: &Email) -> IdentityResult<Option<User>> {
        Ok(self
            .users
            .read()
            .unwrap()
            .iter()
            .find(|u| &u.email == email)
            .cloned())
    }

    async fn exists_by_email(&self, email: &Email) -> IdentityResult<bool> {
        Ok(self.users.read().unwrap().iter().any(|u| &u.email == email))
    }

    async fn find_by_provider(
        &self,
        provider: OAuthProvider,
        provider_id: &str,
    ) -> IdentityResult<Option<User>> {
        Ok(self
            .users
            .read()
            .unwrap()
            .iter()
            .find(|u| u.has_provider(provider, provider_id))
            .cloned())
    }

    async fn update(&self, user: &User) -> IdentityResult<()> {
        let mut users = self.users.write().unwrap();
        if let Some(existing) = users.iter_mut().find(|u| u.user_id == user.user_id) {
            *existing = user.clone();
        }
        Ok(())
    }
}

impl SessionRepository for InMemoryIdentityRepository {
    async fn create(&self, session: &Session) -> IdentityResult<()> {
        self.sessions.write().unwrap().push(session.clone());
        Ok(())
    }

    async fn find_by_id(&self, session_id: &SessionId) -> IdentityResult<Option<Session>> {
        Ok(self
            .sessions
            .read()
            .unwrap()
            .iter()
            .find(|s| &s.session_id == session_id)
            .cloned())
    }

    async fn update(&self, session: &Session) -> IdentityResult<()> {
        let mut sessions = self.sessions.write().unwrap();
        if let Some(existing) = sessions
            .iter_mut()
            .find(|s| s.session_id == session.session_id)
        {
            *existing = session.clone();
        }
        Ok(())
    }

    async fn delete(&self, session_id: &SessionId) -> IdentityResult<()> {
        self.sessions
            .write()
            .unwrap()
            .retain(|s| &s.session_id != session_id);
        Ok(())
    }

    async fn delete_all_for_user(&self, user_id: &UserId) -> IdentityResult<u64> {
        let mut sessions = self.sessions.write().unwrap();
        let before = sessions.len();
        sessions.retain(|s| &s.user_id != user_id);
        Ok((before - sessions.len()) as u64)
    }

    async fn cleanup_expired(&self) -> IdentityResult<u64> {
        let mut sessions = self.sessions.write().unwrap();
        let before = sessions.len();
        sessions.retain(|s| !s.is_expired());
        Ok((before - sessions.len()) as u64)
    }
}

impl VerificationCodeRepository for InMemoryIdentityRepository {
    async fn create(&self, code: &VerificationCode) -> IdentityResult<()> {
        self.codes.write().unwrap().push(code.clone());
        Ok(())
    }

    async fn find_valid(
        &self,
        code: &str,
        purpose: CodePurpose,
    ) -> IdentityResult<Option<VerificationCode>> {
        Ok(self
            .codes
            .read()
            .unwrap()
            .iter()
            .find(|c| c.code == code && c.purpose == purpose && !c.is_expired())
            .cloned())
    }

    async fn count_recent(
        &self,
        user_id: &UserId,
        purpose: CodePurpose,
        since: DateTime<Utc>,
    ) -> IdentityResult<u64> {
        Ok(self
            .codes
            .read()
            .unwrap()
            .iter()
            .filter(|c| &c.user_id == user_id && c.purpose == purpose && c.created_at > since)
            .count() as u64)
    }

    async fn delete(&self, code_id: &CodeId) -> IdentityResult<()> {
        self.codes
            .write()
            .unwrap()
            .retain(|c| &c.code_id != code_id);
        Ok(())
    }

    async fn cleanup_expired(&self) -> IdentityResult<u64> {
        let mut codes = self.codes.write().unwrap();
        let before = codes.len();
        codes.retain(|c| !c.is_expired());
        Ok((before - codes.len()) as u64)
    }
}

// ============================================================================
// Recording mailer
// ============================================================================

/// Mailer that records instead of sending. For tests.
#[derive(Clone, Default)]
pub struct RecordingMailer {
    sent: Arc<RwLock<Vec<SentMail>>>,
}

/// One recorded send
#[derive(Debug, Clone)]
pub struct SentMail {
    pub to: String,
    pub kind: SentMailKind,
    pub link: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentMailKind {
    EmailVerification,
    PasswordReset,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.read().unwrap().clone()
    }
}

impl MailSender for RecordingMailer {
    async fn send_email_verification(&self, to: &Email, link: &str) -> IdentityResult<()> {
        self.sent.write().unwrap().push(SentMail {
            to: to.to_string(),
            kind: SentMailKind::EmailVerification,
            link: link.to_string(),
        });
        Ok(())
    }

    async fn send_password_reset(&self, to: &Email, link: &str) -> IdentityResult<()> {
        self.sent.write().unwrap().push(SentMail {
            to: to.to_string(),
            kind: SentMailKind::PasswordReset,
            link: link.to_string(),
        });
        Ok(())
    }
}
