//! Flow tests for the identity crate
//!
//! Exercise the use cases end to end against the in-memory repositories.

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::application::config::IdentityConfig;
use crate::application::link_identity::{LinkIdentityUseCase, ProviderIdentity};
use crate::application::login::{LoginInput, LoginUseCase};
use crate::application::mfa::{MfaSetupOutput, MfaUseCase};
use crate::application::password_reset::PasswordResetUseCase;
use crate::application::refresh::RefreshUseCase;
use crate::application::register::{RegisterInput, RegisterUseCase};
use crate::application::token::TokenService;
use crate::application::update_role::UpdateRoleUseCase;
use crate::application::verify_email::VerifyEmailUseCase;
use crate::domain::entity::session::Session;
use crate::domain::entity::verification_code::CodePurpose;
use crate::domain::repository::{SessionRepository, UserRepository};
use crate::domain::value_object::email::Email;
use crate::domain::value_object::ids::UserId;
use crate::domain::value_object::provider_link::OAuthProvider;
use crate::error::IdentityError;
use crate::infra::memory::{InMemoryIdentityRepository, RecordingMailer, SentMailKind};

const PASSWORD: &str = "CorrectHorse9!";

struct TestEnv {
    repo: Arc<InMemoryIdentityRepository>,
    mailer: Arc<RecordingMailer>,
    tokens: Arc<TokenService>,
    config: Arc<IdentityConfig>,
}

fn env() -> TestEnv {
    let mut config = IdentityConfig::development();
    config.access_token_secret = "test-access-secret".to_string();
    config.refresh_token_secret = "test-refresh-secret".to_string();

    let tokens = Arc::new(TokenService::new(&config));

    TestEnv {
        repo: Arc::new(InMemoryIdentityRepository::new()),
        mailer: Arc::new(RecordingMailer::new()),
        tokens,
        config: Arc::new(config),
    }
}

impl TestEnv {
    fn register_use_case(
        &self,
    ) -> RegisterUseCase<InMemoryIdentityRepository, InMemoryIdentityRepository, RecordingMailer>
    {
        RegisterUseCase::new(
            self.repo.clone(),
            self.repo.clone(),
            self.mailer.clone(),
            self.config.clone(),
        )
    }

    fn login_use_case(
        &self,
    ) -> LoginUseCase<InMemoryIdentityRepository, InMemoryIdentityRepository> {
        LoginUseCase::new(
            self.repo.clone(),
            self.repo.clone(),
            self.tokens.clone(),
            self.config.clone(),
        )
    }

    fn refresh_use_case(
        &self,
    ) -> RefreshUseCase<InMemoryIdentityRepository, InMemoryIdentityRepository> {
        RefreshUseCase::new(
            self.repo.clone(),
            self.repo.clone(),
            self.tokens.clone(),
            self.config.clone(),
        )
    }

    fn mfa_use_case(&self) -> MfaUseCase<InMemoryIdentityRepository, InMemoryIdentityRepository> {
        MfaUseCase::new(
            self.repo.clone(),
            self.repo.clone(),
            self.tokens.clone(),
            self.config.clone(),
        )
    }

    fn link_use_case(
        &self,
    ) -> LinkIdentityUseCase<InMemoryIdentityRepository, InMemoryIdentityRepository> {
        LinkIdentityUseCase::new(
            self.repo.clone(),
            self.repo.clone(),
            self.tokens.clone(),
            self.config.clone(),
        )
    }

    fn reset_use_case(
        &self,
    ) -> PasswordResetUseCase<
        InMemoryIdentityRepository,
        InMemoryIdentityRepository,
        InMemoryIdentityRepository,
        RecordingMailer,
    > {
        PasswordResetUseCase::new(
            self.repo.clone(),
            self.repo.clone(),
            self.repo.clone(),
            self.mailer.clone(),
            self.config.clone(),
        )
    }

    fn update_role_use_case(
        &self,
    ) -> UpdateRoleUseCase<InMemoryIdentityRepository, InMemoryIdentityRepository> {
        UpdateRoleUseCase::new(
            self.repo.clone(),
            self.repo.clone(),
            self.tokens.clone(),
            self.config.clone(),
        )
    }

    async fn register(&self, email: &str) -> UserId {
        let output = self
            .register_use_case()
            .execute(RegisterInput {
                name: "Test User".to_string(),
                email: email.to_string(),
                password: PASSWORD.to_string(),
                confirm_password: PASSWORD.to_string(),
                role: "jobseeker".to_string(),
            })
            .await
            .unwrap();

        UserId::from_uuid(output.user.id.parse().unwrap())
    }

    async fn enroll_mfa(&self, user_id: &UserId) -> crate::domain::value_object::totp_secret::TotpSecret {
        let mut user = UserRepository::find_by_id(self.repo.as_ref(), user_id)
            .await
            .unwrap()
            .unwrap();
        let secret = user.begin_mfa_enrollment();
        user.confirm_mfa_enrollment();
        UserRepository::update(self.repo.as_ref(), &user)
            .await
            .unwrap();
        secret
    }
}

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn register_duplicate_email_conflicts() {
    let env = env();
    env.register("alice@example.com").await;

    let second = env
        .register_use_case()
        .execute(RegisterInput {
            name: "Alice Again".to_string(),
            // Different case, same address
            email: "Alice@Example.COM".to_string(),
            password: PASSWORD.to_string(),
            confirm_password: PASSWORD.to_string(),
            role: "recruiter".to_string(),
        })
        .await;

    assert!(matches!(second, Err(IdentityError::Conflict(_))));
    assert_eq!(env.repo.user_count(), 1);
}

#[tokio::test]
async fn register_password_mismatch_rejected() {
    let env = env();
    let result = env
        .register_use_case()
        .execute(RegisterInput {
            name: "Bob".to_string(),
            email: "bob@example.com".to_string(),
            password: PASSWORD.to_string(),
            confirm_password: "SomethingElse9!".to_string(),
            role: "jobseeker".to_string(),
        })
        .await;

    assert!(matches!(result, Err(IdentityError::Validation(_))));
}

#[tokio::test]
async fn register_triggers_verification_email() {
    let env = env();
    let user_id = env.register("alice@example.com").await;

    let sent = env.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].kind, SentMailKind::EmailVerification);
    assert_eq!(sent[0].to, "alice@example.com");

    let code = env
        .repo
        .latest_code(&user_id, CodePurpose::EmailVerification)
        .unwrap();
    assert!(sent[0].link.contains(&code.code));
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn login_failures_carry_no_enumeration_signal() {
    let env = env();
    env.register("alice@example.com").await;

    let wrong_password = env
        .login_use_case()
        .execute(LoginInput {
            email: "alice@example.com".to_string(),
            password: "WrongPassword9!".to_string(),
            user_agent: None,
        })
        .await
        .unwrap_err();

    let unknown_email = env
        .login_use_case()
        .execute(LoginInput {
            email: "nobody@example.com".to_string(),
            password: PASSWORD.to_string(),
            user_agent: None,
        })
        .await
        .unwrap_err();

    // Exactly the same message for both failure modes
    assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    assert!(matches!(wrong_password, IdentityError::InvalidCredentials));
    assert!(matches!(unknown_email, IdentityError::InvalidCredentials));
}

#[tokio::test]
async fn login_issues_session_bound_tokens() {
    let env = env();
    let user_id = env.register("alice@example.com").await;

    let output = env
        .login_use_case()
        .execute(LoginInput {
            email: "alice@example.com".to_string(),
            password: PASSWORD.to_string(),
            user_agent: Some("integration-test".to_string()),
        })
        .await
        .unwrap();

    assert!(!output.mfa_required);
    let tokens = output.tokens.unwrap();
    assert_eq!(env.repo.session_count(&user_id), 1);

    let claims = env.tokens.verify_access(&tokens.access_token).unwrap();
    assert_eq!(claims.user_id().unwrap(), user_id);

    let refresh_claims = env.tokens.verify_refresh(&tokens.refresh_token).unwrap();
    assert_eq!(
        refresh_claims.session_id().unwrap(),
        claims.session_id().unwrap()
    );
}

// ============================================================================
// MFA
// ============================================================================

#[tokio::test]
async fn mfa_login_defers_token_issuance() {
    let env = env();
    let user_id = env.register("alice@example.com").await;
    let secret = env.enroll_mfa(&user_id).await;

    let output = env
        .login_use_case()
        .execute(LoginInput {
            email: "alice@example.com".to_string(),
            password: PASSWORD.to_string(),
            user_agent: None,
        })
        .await
        .unwrap();

    // Deferred: flag set, no tokens, no session
    assert!(output.mfa_required);
    assert!(output.tokens.is_none());
    assert_eq!(env.repo.session_count(&user_id), 0);

    // A bad code does not complete the login
    let bad = env
        .mfa_use_case()
        .verify_for_login("000000", "alice@example.com", None)
        .await;
    assert!(matches!(bad, Err(IdentityError::InvalidMfaCode)));

    // A valid code behaves exactly like the tail of a normal login
    let code = secret.generate_current("alice@example.com").unwrap();
    let completed = env
        .mfa_use_case()
        .verify_for_login(&code, "alice@example.com", None)
        .await
        .unwrap();

    assert_eq!(env.repo.session_count(&user_id), 1);
    let claims = env
        .tokens
        .verify_access(&completed.tokens.access_token)
        .unwrap();
    assert_eq!(claims.user_id().unwrap(), user_id);
}

#[tokio::test]
async fn mfa_verify_login_error_cases() {
    let env = env();
    env.register("alice@example.com").await;

    // Unknown user
    let missing = env
        .mfa_use_case()
        .verify_for_login("000000", "nobody@example.com", None)
        .await;
    assert!(matches!(missing, Err(IdentityError::NotFound(_))));

    // Known user without enrollment
    let unenrolled = env
        .mfa_use_case()
        .verify_for_login("000000", "alice@example.com", None)
        .await;
    assert!(matches!(unenrolled, Err(IdentityError::MfaNotEnrolled)));
}

#[tokio::test]
async fn mfa_setup_is_idempotent_until_confirmed() {
    let env = env();
    let user_id = env.register("alice@example.com").await;
    let mfa = env.mfa_use_case();

    let first = match mfa.generate_setup(&user_id).await.unwrap() {
        MfaSetupOutput::Setup { secret, .. } => secret,
        MfaSetupOutput::AlreadyEnabled => panic!("not enrolled yet"),
    };

    // Second call before confirmation returns the identical secret
    let second = match mfa.generate_setup(&user_id).await.unwrap() {
        MfaSetupOutput::Setup { secret, .. } => secret,
        MfaSetupOutput::AlreadyEnabled => panic!("not enrolled yet"),
    };
    assert_eq!(first, second);

    // Confirm with a valid code; setup becomes an informational no-op
    let totp = crate::domain::value_object::totp_secret::TotpSecret::from_base32(&first).unwrap();
    let code = totp.generate_current("alice@example.com").unwrap();
    mfa.verify_setup(&user_id, &code, &first).await.unwrap();

    assert!(matches!(
        mfa.generate_setup(&user_id).await.unwrap(),
        MfaSetupOutput::AlreadyEnabled
    ));
}

#[tokio::test]
async fn mfa_verify_setup_rejects_bad_code() {
    let env = env();
    let user_id = env.register("alice@example.com").await;
    let mfa = env.mfa_use_case();

    let secret = match mfa.generate_setup(&user_id).await.unwrap() {
        MfaSetupOutput::Setup { secret, .. } => secret,
        MfaSetupOutput::AlreadyEnabled => panic!("not enrolled yet"),
    };

    let result = mfa.verify_setup(&user_id, "000000", &secret).await;
    assert!(matches!(result, Err(IdentityError::InvalidMfaCode)));

    // State unchanged
    let user = UserRepository::find_by_id(env.repo.as_ref(), &user_id)
        .await
        .unwrap()
        .unwrap();
    assert!(!user.mfa.enabled);
}

#[tokio::test]
async fn mfa_revoke_is_idempotent() {
    let env = env();
    let user_id = env.register("alice@example.com").await;
    let mfa = env.mfa_use_case();

    // Not enabled: no-op
    assert!(matches!(
        mfa.revoke(&user_id).await.unwrap(),
        crate::application::mfa::MfaRevokeOutput::NotEnabled
    ));

    env.enroll_mfa(&user_id).await;
    assert!(matches!(
        mfa.revoke(&user_id).await.unwrap(),
        crate::application::mfa::MfaRevokeOutput::Revoked
    ));

    let user = UserRepository::find_by_id(env.repo.as_ref(), &user_id)
        .await
        .unwrap()
        .unwrap();
    assert!(!user.mfa.enabled);
    assert!(user.mfa.secret.is_none());
}

// ============================================================================
// Refresh rotation
// ============================================================================

#[tokio::test]
async fn refresh_far_from_expiry_rotates_access_only() {
    let env = env();
    let user_id = env.register("alice@example.com").await;

    let session = Session::new(user_id, None, Duration::days(30));
    let expires_before = session.expires_at;
    env.repo.insert_session(session.clone());

    let refresh_token = env.tokens.issue_refresh(&session.session_id).unwrap();
    let output = env.refresh_use_case().execute(&refresh_token).await.unwrap();

    // Only the access token changes; the refresh token stays as-is
    assert!(output.refresh_token.is_none());
    assert!(env.tokens.verify_access(&output.access_token).is_ok());

    let stored = SessionRepository::find_by_id(env.repo.as_ref(), &session.session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.expires_at, expires_before);
}

#[tokio::test]
async fn refresh_near_expiry_rotates_both_and_extends_session() {
    let env = env();
    let user_id = env.register("alice@example.com").await;

    let mut session = Session::new(user_id, None, Duration::days(30));
    session.expires_at = Utc::now() + Duration::hours(12);
    env.repo.insert_session(session.clone());

    let refresh_token = env.tokens.issue_refresh(&session.session_id).unwrap();
    let output = env.refresh_use_case().execute(&refresh_token).await.unwrap();

    // Both tokens rotate, and the session gains the full refresh TTL
    let new_refresh = output.refresh_token.expect("refresh token should rotate");
    assert!(env.tokens.verify_refresh(&new_refresh).is_ok());

    let stored = SessionRepository::find_by_id(env.repo.as_ref(), &session.session_id)
        .await
        .unwrap()
        .unwrap();
    assert!(stored.expires_at > Utc::now() + Duration::days(29));
}

#[tokio::test]
async fn refresh_rejects_dead_sessions() {
    let env = env();
    let user_id = env.register("alice@example.com").await;

    // Expired session: record exists but is logically dead
    let mut expired = Session::new(user_id, None, Duration::days(30));
    expired.expires_at = Utc::now() - Duration::seconds(5);
    env.repo.insert_session(expired.clone());

    let token = env.tokens.issue_refresh(&expired.session_id).unwrap();
    assert!(matches!(
        env.refresh_use_case().execute(&token).await,
        Err(IdentityError::SessionExpired)
    ));

    // Missing session
    let ghost = Session::new(user_id, None, Duration::days(30));
    let token = env.tokens.issue_refresh(&ghost.session_id).unwrap();
    assert!(matches!(
        env.refresh_use_case().execute(&token).await,
        Err(IdentityError::NotFound(_))
    ));

    // Garbage token
    assert!(matches!(
        env.refresh_use_case().execute("not.a.token").await,
        Err(IdentityError::Token(_))
    ));
}

// ============================================================================
// Role selection
// ============================================================================

#[tokio::test]
async fn update_role_revokes_old_sessions_and_issues_fresh_tokens() {
    let env = env();
    let user_id = env.register("alice@example.com").await;

    let old = env
        .login_use_case()
        .execute(LoginInput {
            email: "alice@example.com".to_string(),
            password: PASSWORD.to_string(),
            user_agent: None,
        })
        .await
        .unwrap()
        .tokens
        .unwrap();

    let output = env
        .update_role_use_case()
        .execute(&user_id, "recruiter", None)
        .await
        .unwrap();

    // Pre-update refresh token now references a deleted session
    assert!(matches!(
        env.refresh_use_case().execute(&old.refresh_token).await,
        Err(IdentityError::NotFound(_))
    ));

    // The fresh pair is bound to the new role
    let claims = env
        .tokens
        .verify_access(&output.tokens.access_token)
        .unwrap();
    assert_eq!(
        claims.role,
        crate::domain::value_object::user_role::UserRole::Recruiter
    );
    assert!(
        env.refresh_use_case()
            .execute(&output.tokens.refresh_token)
            .await
            .is_ok()
    );
    assert_eq!(env.repo.session_count(&user_id), 1);
}

#[tokio::test]
async fn update_role_rejects_non_selectable_roles() {
    let env = env();
    let user_id = env.register("alice@example.com").await;
    let use_case = env.update_role_use_case();

    for role in ["admin", "pending", "superuser"] {
        assert!(matches!(
            use_case.execute(&user_id, role, None).await,
            Err(IdentityError::Validation(_))
        ));
    }
}

// ============================================================================
// Email verification
// ============================================================================

#[tokio::test]
async fn verify_email_consumes_the_code() {
    let env = env();
    let user_id = env.register("alice@example.com").await;

    let code = env
        .repo
        .latest_code(&user_id, CodePurpose::EmailVerification)
        .unwrap();

    let use_case = VerifyEmailUseCase::new(env.repo.clone(), env.repo.clone());
    let output = use_case.execute(&code.code).await.unwrap();
    assert!(output.user.email_verified);

    // One-shot: the same code cannot be used again
    assert!(matches!(
        use_case.execute(&code.code).await,
        Err(IdentityError::NotFound(_))
    ));
}

#[tokio::test]
async fn verify_email_rejects_unknown_code() {
    let env = env();
    env.register("alice@example.com").await;

    let use_case = VerifyEmailUseCase::new(env.repo.clone(), env.repo.clone());
    assert!(matches!(
        use_case.execute("definitely-not-a-code").await,
        Err(IdentityError::NotFound(_))
    ));
}

// ============================================================================
// Password reset
// ============================================================================

#[tokio::test]
async fn forgot_password_is_rate_limited() {
    let env = env();
    env.register("alice@example.com").await;
    let use_case = env.reset_use_case();

    use_case.forgot("alice@example.com").await.unwrap();
    use_case.forgot("alice@example.com").await.unwrap();

    // Third request inside the rolling window is a terminal error
    assert!(matches!(
        use_case.forgot("alice@example.com").await,
        Err(IdentityError::RateLimited)
    ));

    // Unknown address is a NotFound, not a silent success
    assert!(matches!(
        use_case.forgot("nobody@example.com").await,
        Err(IdentityError::NotFound(_))
    ));
}

#[tokio::test]
async fn reset_password_revokes_every_session() {
    let env = env();
    let user_id = env.register("alice@example.com").await;

    let old = env
        .login_use_case()
        .execute(LoginInput {
            email: "alice@example.com".to_string(),
            password: PASSWORD.to_string(),
            user_agent: None,
        })
        .await
        .unwrap()
        .tokens
        .unwrap();

    let use_case = env.reset_use_case();
    use_case.forgot("alice@example.com").await.unwrap();

    let code = env
        .repo
        .latest_code(&user_id, CodePurpose::PasswordReset)
        .unwrap();

    use_case
        .reset(&code.code, "BrandNewPass7!".to_string())
        .await
        .unwrap();

    // A session created before the reset cannot be refreshed afterward
    assert!(matches!(
        env.refresh_use_case().execute(&old.refresh_token).await,
        Err(IdentityError::NotFound(_))
    ));
    assert_eq!(env.repo.session_count(&user_id), 0);

    // Old password no longer works, the new one does
    assert!(matches!(
        env.login_use_case()
            .execute(LoginInput {
                email: "alice@example.com".to_string(),
                password: PASSWORD.to_string(),
                user_agent: None,
            })
            .await,
        Err(IdentityError::InvalidCredentials)
    ));
    assert!(
        env.login_use_case()
            .execute(LoginInput {
                email: "alice@example.com".to_string(),
                password: "BrandNewPass7!".to_string(),
                user_agent: None,
            })
            .await
            .unwrap()
            .tokens
            .is_some()
    );
}

// ============================================================================
// Identity linking
// ============================================================================

fn google_identity(provider_id: &str, email: &str) -> ProviderIdentity {
    ProviderIdentity {
        provider: OAuthProvider::Google,
        provider_id: provider_id.to_string(),
        email: email.to_string(),
        display_name: Some("Alice".to_string()),
    }
}

#[tokio::test]
async fn resolve_creates_once_then_reuses() {
    let env = env();
    let use_case = env.link_use_case();

    // First callback creates exactly one user
    let first = use_case
        .resolve(google_identity("g-1", "alice@x.com"), None)
        .await
        .unwrap();
    assert_eq!(env.repo.user_count(), 1);
    assert!(first.user.email_verified);
    assert_eq!(first.user.role.to_string(), "pending");

    // Same (provider, id) resolves to the same user, no duplicate
    let second = use_case
        .resolve(google_identity("g-1", "alice@x.com"), None)
        .await
        .unwrap();
    assert_eq!(env.repo.user_count(), 1);
    assert_eq!(first.user.id, second.user.id);

    // Different provider, same email: link appended, still one user
    let linked = use_case
        .resolve(
            ProviderIdentity {
                provider: OAuthProvider::LinkedIn,
                provider_id: "li-9".to_string(),
                email: "alice@x.com".to_string(),
                display_name: None,
            },
            None,
        )
        .await
        .unwrap();
    assert_eq!(env.repo.user_count(), 1);
    assert_eq!(linked.user.id, first.user.id);
    assert_eq!(linked.user.providers.len(), 2);
}

#[tokio::test]
async fn resolve_links_provider_to_password_account_by_email() {
    let env = env();
    let user_id = env.register("alice@example.com").await;

    let output = env
        .link_use_case()
        .resolve(google_identity("g-55", "alice@example.com"), None)
        .await
        .unwrap();

    assert_eq!(env.repo.user_count(), 1);
    assert_eq!(output.user.id, user_id.to_string());

    let user = UserRepository::find_by_id(env.repo.as_ref(), &user_id)
        .await
        .unwrap()
        .unwrap();
    assert!(user.has_provider(OAuthProvider::Google, "g-55"));
}

#[tokio::test]
async fn resolve_issues_tokens_without_consulting_mfa() {
    let env = env();
    let user_id = env.register("alice@example.com").await;
    env.enroll_mfa(&user_id).await;

    // Password login defers...
    let login = env
        .login_use_case()
        .execute(LoginInput {
            email: "alice@example.com".to_string(),
            password: PASSWORD.to_string(),
            user_agent: None,
        })
        .await
        .unwrap();
    assert!(login.mfa_required);

    // ...but the provider path issues tokens immediately
    let output = env
        .link_use_case()
        .resolve(google_identity("g-55", "alice@example.com"), None)
        .await
        .unwrap();
    assert!(env.tokens.verify_access(&output.tokens.access_token).is_ok());
}

#[tokio::test]
async fn resolve_rejects_identity_without_email() {
    let env = env();
    let result = env
        .link_use_case()
        .resolve(
            ProviderIdentity {
                provider: OAuthProvider::Google,
                provider_id: "g-1".to_string(),
                email: "".to_string(),
                display_name: None,
            },
            None,
        )
        .await;

    assert!(matches!(result, Err(IdentityError::Validation(_))));
    assert_eq!(env.repo.user_count(), 0);
}

// ============================================================================
// Expiry housekeeping
// ============================================================================

#[tokio::test]
async fn expired_codes_are_invisible_and_cleanable() {
    let env = env();
    let user_id = env.register("alice@example.com").await;

    let mut code = crate::domain::entity::verification_code::VerificationCode::password_reset(
        user_id,
    );
    code.expires_at = Utc::now() - Duration::minutes(1);
    crate::domain::repository::VerificationCodeRepository::create(env.repo.as_ref(), &code)
        .await
        .unwrap();

    // Lazily filtered on read
    let found = crate::domain::repository::VerificationCodeRepository::find_valid(
        env.repo.as_ref(),
        &code.code,
        CodePurpose::PasswordReset,
    )
    .await
    .unwrap();
    assert!(found.is_none());

    // And removable by the startup sweep
    let removed = crate::domain::repository::VerificationCodeRepository::cleanup_expired(
        env.repo.as_ref(),
    )
    .await
    .unwrap();
    assert_eq!(removed, 1);
}

#[tokio::test]
async fn email_uniqueness_is_case_insensitive_in_lookups() {
    let env = env();
    env.register("alice@example.com").await;

    let upper = Email::new("ALICE@EXAMPLE.COM").unwrap();
    let found = UserRepository::find_by_email(env.repo.as_ref(), &upper)
        .await
        .unwrap();
    assert!(found.is_some());
}
