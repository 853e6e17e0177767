//! User Entity
//!
//! Root identity aggregate. Carries the credential hash, role,
//! email-verification state, MFA settings, and linked external identities.
//!
//! Construction goes through the factories below so the password is always
//! hashed exactly once, before the value exists. There is no
//! hash-on-persist hook anywhere.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::value_object::{
    email::Email,
    ids::UserId,
    provider_link::{OAuthProvider, ProviderLink},
    totp_secret::TotpSecret,
    user_password::{RawPassword, UserPassword},
    user_role::UserRole,
};
use kernel::error::app_error::AppResult;

/// MFA enrollment state carried on the user
///
/// `NotEnrolled`: enabled=false, secret=None.
/// `PendingSecret`: enabled=false, secret=Some (generated, unconfirmed).
/// `Enrolled`: enabled=true.
#[derive(Debug, Clone, Default)]
pub struct MfaSettings {
    pub enabled: bool,
    pub secret: Option<TotpSecret>,
}

/// User entity
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: UserId,
    /// Display name, as given at registration or by the identity provider
    pub name: String,
    /// Unique, stored lowercase
    pub email: Email,
    /// Argon2id PHC hash, never serialized
    pub password_hash: UserPassword,
    /// Starts `Pending`, changed only by the role-selection operation
    pub role: UserRole,
    pub email_verified: bool,
    pub mfa: MfaSettings,
    /// Linked external identities; pair-unique within this user
    pub providers: Vec<ProviderLink>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a user from credential registration.
    ///
    /// Hashes the password here, before the entity exists.
    pub fn register(
        name: impl Into<String>,
        email: Email,
        password: &RawPassword,
        role: UserRole,
        pepper: Option<&[u8]>,
    ) -> AppResult<Self> {
        let now = Utc::now();
        Ok(Self {
            user_id: UserId::new(),
            name: name.into(),
            email,
            password_hash: UserPassword::from_raw(password, pepper)?,
            role,
            email_verified: false,
            mfa: MfaSettings::default(),
            providers: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Create a user from a trusted identity provider assertion.
    ///
    /// The credential is a random placeholder that is never disclosed, so
    /// the password path cannot be used for this account. The provider's
    /// email is trusted as verified.
    pub fn from_provider(
        name: impl Into<String>,
        email: Email,
        provider: OAuthProvider,
        provider_id: impl Into<String>,
        pepper: Option<&[u8]>,
    ) -> AppResult<Self> {
        let now = Utc::now();
        Ok(Self {
            user_id: UserId::new(),
            name: name.into(),
            email,
            password_hash: UserPassword::random(pepper)?,
            role: UserRole::Pending,
            email_verified: true,
            mfa: MfaSettings::default(),
            providers: vec![ProviderLink::new(provider, provider_id)],
            created_at: now,
            updated_at: now,
        })
    }

    /// Verify a plaintext password against the stored hash
    pub fn verify_password(&self, raw: &RawPassword, pepper: Option<&[u8]>) -> bool {
        self.password_hash.verify(raw, pepper)
    }

    /// Replace the credential (password reset)
    pub fn set_password(&mut self, hash: UserPassword) {
        self.password_hash = hash;
        self.updated_at = Utc::now();
    }

    /// Change the role (role-selection operation only)
    pub fn set_role(&mut self, role: UserRole) {
        self.role = role;
        self.updated_at = Utc::now();
    }

    /// Mark the email address as verified
    pub fn mark_email_verified(&mut self) {
        self.email_verified = true;
        self.updated_at = Utc::now();
    }

    /// Whether the given external identity is already attached
    pub fn has_provider(&self, provider: OAuthProvider, provider_id: &str) -> bool {
        self.providers
            .iter()
            .any(|p| p.matches(provider, provider_id))
    }

    /// Attach an external identity if not already present.
    ///
    /// Returns true when the set changed.
    pub fn link_provider(&mut self, provider: OAuthProvider, provider_id: &str) -> bool {
        if self.has_provider(provider, provider_id) {
            return false;
        }
        self.providers.push(ProviderLink::new(provider, provider_id));
        self.updated_at = Utc::now();
        true
    }

    /// Begin MFA enrollment: keep an existing pending secret, otherwise
    /// generate one. Returns the secret to show the user.
    pub fn begin_mfa_enrollment(&mut self) -> TotpSecret {
        if let Some(secret) = &self.mfa.secret {
            return secret.clone();
        }
        let secret = TotpSecret::generate();
        self.mfa.secret = Some(secret.clone());
        self.updated_at = Utc::now();
        secret
    }

    /// Confirm MFA enrollment (code already validated by the caller)
    pub fn confirm_mfa_enrollment(&mut self) {
        self.mfa.enabled = true;
        self.updated_at = Utc::now();
    }

    /// Clear MFA state entirely
    pub fn revoke_mfa(&mut self) {
        self.mfa.secret = None;
        self.mfa.enabled = false;
        self.updated_at = Utc::now();
    }

    /// Sanitized projection for anything that leaves the process
    pub fn view(&self) -> UserView {
        UserView {
            id: self.user_id.to_string(),
            name: self.name.clone(),
            email: self.email.to_string(),
            role: self.role,
            email_verified: self.email_verified,
            mfa_enabled: self.mfa.enabled,
            providers: self.providers.iter().map(|p| p.provider).collect(),
            created_at: self.created_at,
        }
    }
}

/// Public projection of a user.
///
/// This is the only serializable user shape; the entity itself is never
/// serialized, so `password_hash` and `mfa.secret` cannot leak through a
/// response body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub email_verified: bool,
    pub mfa_enabled: bool,
    pub providers: Vec<OAuthProvider>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> User {
        let raw = RawPassword::new("CorrectHorse9!".to_string()).unwrap();
        User::register(
            "Alice",
            Email::new("alice@example.com").unwrap(),
            &raw,
            UserRole::Jobseeker,
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_register_hashes_password() {
        let user = alice();
        assert!(user.password_hash.as_phc_string().starts_with("$argon2"));

        let raw = RawPassword::new("CorrectHorse9!".to_string()).unwrap();
        assert!(user.verify_password(&raw, None));

        let wrong = RawPassword::new("WrongHorse9!".to_string()).unwrap();
        assert!(!user.verify_password(&wrong, None));
    }

    #[test]
    fn test_register_defaults() {
        let user = alice();
        assert!(!user.email_verified);
        assert!(!user.mfa.enabled);
        assert!(user.mfa.secret.is_none());
        assert!(user.providers.is_empty());
    }

    #[test]
    fn test_from_provider_trusted_email() {
        let user = User::from_provider(
            "Bob",
            Email::new("bob@example.com").unwrap(),
            OAuthProvider::Google,
            "google-sub-1",
            None,
        )
        .unwrap();

        assert_eq!(user.role, UserRole::Pending);
        assert!(user.email_verified);
        assert!(user.has_provider(OAuthProvider::Google, "google-sub-1"));
    }

    #[test]
    fn test_link_provider_is_pair_unique() {
        let mut user = alice();
        assert!(user.link_provider(OAuthProvider::Google, "g-1"));
        assert!(!user.link_provider(OAuthProvider::Google, "g-1"));
        assert!(user.link_provider(OAuthProvider::LinkedIn, "g-1"));
        assert_eq!(user.providers.len(), 2);
    }

    #[test]
    fn test_mfa_enrollment_state_machine() {
        let mut user = alice();

        // NotEnrolled -> PendingSecret
        let first = user.begin_mfa_enrollment();
        assert!(!user.mfa.enabled);

        // Calling again without confirmation returns the same secret
        let second = user.begin_mfa_enrollment();
        assert_eq!(first.as_base32(), second.as_base32());

        // PendingSecret -> Enrolled
        user.confirm_mfa_enrollment();
        assert!(user.mfa.enabled);

        // Enrolled -> NotEnrolled
        user.revoke_mfa();
        assert!(!user.mfa.enabled);
        assert!(user.mfa.secret.is_none());
    }

    #[test]
    fn test_view_excludes_sensitive_fields() {
        let mut user = alice();
        user.begin_mfa_enrollment();

        let view = user.view();
        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("argon2"));
        assert!(!json.contains("secret"));
        assert!(!json.contains("passwordHash"));
        assert!(json.contains("\"email\":\"alice@example.com\""));
    }
}
