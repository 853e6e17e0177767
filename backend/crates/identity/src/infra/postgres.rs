//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::{
    session::Session,
    user::{MfaSettings, User},
    verification_code::{CodePurpose, VerificationCode},
};
use crate::domain::repository::{SessionRepository, UserRepository, VerificationCodeRepository};
use crate::domain::value_object::{
    email::Email,
    ids::{CodeId, SessionId, UserId},
    provider_link::{OAuthProvider, ProviderLink},
    totp_secret::TotpSecret,
    user_password::UserPassword,
    user_role::UserRole,
};
use crate::error::{IdentityError, IdentityResult};

/// PostgreSQL-backed identity repository
#[derive(Clone)]
pub struct PgIdentityRepository {
    pool: PgPool,
}

impl PgIdentityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Best-effort startup cleanup of expired sessions and codes
    pub async fn cleanup_expired_all(&self) -> IdentityResult<(u64, u64)> {
        let sessions = SessionRepository::cleanup_expired(self).await?;
        let codes = VerificationCodeRepository::cleanup_expired(self).await?;

        tracing::info!(
            sessions_deleted = sessions,
            codes_deleted = codes,
            "Cleaned up expired identity records"
        );

        Ok((sessions, codes))
    }

    async fn load_provider_links(&self, user_id: Uuid) -> IdentityResult<Vec<ProviderLink>> {
        let rows = sqlx::query_as::<_, ProviderRow>(
            r#"
            SELECT provider, provider_id
            FROM user_providers
            WHERE user_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.into_link()).collect()
    }

    async fn load_user(&self, row: UserRow) -> IdentityResult<User> {
        let providers = self.load_provider_links(row.user_id).await?;
        row.into_user(providers)
    }
}

// ============================================================================
// User Repository Implementation
// ============================================================================

const USER_COLUMNS: &str = r#"
    user_id,
    name,
    email,
    password_hash,
    user_role,
    email_verified,
    mfa_enabled,
    mfa_secret,
    created_at,
    updated_at
"#;

impl UserRepository for PgIdentityRepository {
    async fn create(&self, user: &User) -> IdentityResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (
                user_id,
                name,
                email,
                password_hash,
                user_role,
                email_verified,
                mfa_enabled,
                mfa_secret,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(&user.name)
        .bind(user.email.as_str())
        .bind(user.password_hash.as_phc_string())
        .bind(user.role.id())
        .bind(user.email_verified)
        .bind(user.mfa.enabled)
        .bind(user.mfa.secret.as_ref().map(|s| s.as_base32()))
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        for link in &user.providers {
            sqlx::query(
                r#"
                INSERT INTO user_providers (user_id, provider, provider_id, created_at)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(user.user_id.as_uuid())
            .bind(link.provider.code())
            .bind(&link.provider_id)
            .bind(user.created_at)
            .execute(&self.pool)
            .await?;
        }

        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> IdentityResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE user_id = $1"
        ))
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.load_user(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_by_email(&self, email: &Email) -> IdentityResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.load_user(row).await?)),
            None => Ok(None),
        }
    }

    async fn exists_by_email(&self, email: &Email) -> IdentityResult<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email.as_str())
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn find_by_provider(
        &self,
        provider: OAuthProvider,
        provider_id: &str,
    ) -> IdentityResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            SELECT {USER_COLUMNS} FROM users
            WHERE user_id = (
                SELECT user_id FROM user_providers
                WHERE provider = $1 AND provider_id = $2
                LIMIT 1
            )
            "#
        ))
        .bind(provider.code())
        .bind(provider_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.load_user(row).await?)),
            None => Ok(None),
        }
    }

    async fn update(&self, user: &User) -> IdentityResult<()> {
        sqlx::query(
            r#"
            UPDATE users SET
                name = $2,
                email = $3,
                password_hash = $4,
                user_role = $5,
                email_verified = $6,
                mfa_enabled = $7,
                mfa_secret = $8,
                updated_at = $9
            WHERE user_id = $1
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(&user.name)
        .bind(user.email.as_str())
        .bind(user.password_hash.as_phc_string())
        .bind(user.role.id())
        .bind(user.email_verified)
        .bind(user.mfa.enabled)
        .bind(user.mfa.secret.as_ref().map(|s| s.as_base32()))
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        // Links only ever grow; insert the ones not present yet
        for link in &user.providers {
            sqlx::query(
                r#"
                INSERT INTO user_providers (user_id, provider, provider_id, created_at)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (user_id, provider, provider_id) DO NOTHING
                "#,
            )
            .bind(user.user_id.as_uuid())
            .bind(link.provider.code())
            .bind(&link.provider_id)
            .bind(user.updated_at)
            .execute(&self.pool)
            .await?;
        }

        Ok(())
    }
}

// ============================================================================
// Session Repository Implementation
// ============================================================================

impl SessionRepository for PgIdentityRepository {
    async fn create(&self, session: &Session) -> IdentityResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions (session_id, user_id, user_agent, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(session.session_id.as_uuid())
        .bind(session.user_id.as_uuid())
        .bind(&session.user_agent)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, session_id: &SessionId) -> IdentityResult<Option<Session>> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT session_id, user_id, user_agent, created_at, expires_at
            FROM sessions
            WHERE session_id = $1
            "#,
        )
        .bind(session_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_session()))
    }

    async fn update(&self, session: &Session) -> IdentityResult<()> {
        sqlx::query("UPDATE sessions SET expires_at = $2 WHERE session_id = $1")
            .bind(session.session_id.as_uuid())
            .bind(session.expires_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete(&self, session_id: &SessionId) -> IdentityResult<()> {
        sqlx::query("DELETE FROM sessions WHERE session_id = $1")
            .bind(session_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_all_for_user(&self, user_id: &UserId) -> IdentityResult<u64> {
        let deleted = sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted)
    }

    async fn cleanup_expired(&self) -> IdentityResult<u64> {
        let deleted = sqlx::query("DELETE FROM sessions WHERE expires_at < $1")
            .bind(Utc::now())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted)
    }
}

// ============================================================================
// Verification Code Repository Implementation
// ============================================================================

impl VerificationCodeRepository for PgIdentityRepository {
    async fn create(&self, code: &VerificationCode) -> IdentityResult<()> {
        sqlx::query(
            r#"
            INSERT INTO verification_codes (code_id, user_id, purpose, code, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(code.code_id.as_uuid())
        .bind(code.user_id.as_uuid())
        .bind(code.purpose.code())
        .bind(&code.code)
        .bind(code.created_at)
        .bind(code.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_valid(
        &self,
        code: &str,
        purpose: CodePurpose,
    ) -> IdentityResult<Option<VerificationCode>> {
        let row = sqlx::query_as::<_, VerificationCodeRow>(
            r#"
            SELECT code_id, user_id, purpose, code, created_at, expires_at
            FROM verification_codes
            WHERE code = $1 AND purpose = $2 AND expires_at > $3
            "#,
        )
        .bind(code)
        .bind(purpose.code())
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_code()).transpose()
    }

    async fn count_recent(
        &self,
        user_id: &UserId,
        purpose: CodePurpose,
        since: DateTime<Utc>,
    ) -> IdentityResult<u64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM verification_codes
            WHERE user_id = $1 AND purpose = $2 AND created_at > $3
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(purpose.code())
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(count as u64)
    }

    async fn delete(&self, code_id: &CodeId) -> IdentityResult<()> {
        sqlx::query("DELETE FROM verification_codes WHERE code_id = $1")
            .bind(code_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn cleanup_expired(&self) -> IdentityResult<u64> {
        let deleted = sqlx::query("DELETE FROM verification_codes WHERE expires_at < $1")
            .bind(Utc::now())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted)
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    user_role: i16,
    email_verified: bool,
    mfa_enabled: bool,
    mfa_secret: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self, providers: Vec<ProviderLink>) -> IdentityResult<User> {
        let role = UserRole::from_id(self.user_role)
            .ok_or_else(|| IdentityError::Internal(format!("Invalid role id: {}", self.user_role)))?;

        let secret = self
            .mfa_secret
            .map(TotpSecret::from_base32)
            .transpose()
            .map_err(|e| IdentityError::Internal(format!("Invalid TOTP secret: {}", e)))?;

        Ok(User {
            user_id: UserId::from_uuid(self.user_id),
            name: self.name,
            email: Email::from_db(self.email),
            password_hash: UserPassword::from_phc_string(self.password_hash)?,
            role,
            email_verified: self.email_verified,
            mfa: MfaSettings {
                enabled: self.mfa_enabled,
                secret,
            },
            providers,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ProviderRow {
    provider: String,
    provider_id: String,
}

impl ProviderRow {
    fn into_link(self) -> IdentityResult<ProviderLink> {
        let provider = OAuthProvider::from_code(&self.provider)
            .ok_or_else(|| IdentityError::Internal(format!("Unknown provider: {}", self.provider)))?;

        Ok(ProviderLink {
            provider,
            provider_id: self.provider_id,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    session_id: Uuid,
    user_id: Uuid,
    user_agent: Option<String>,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl SessionRow {
    fn into_session(self) -> Session {
        Session {
            session_id: SessionId::from_uuid(self.session_id),
            user_id: UserId::from_uuid(self.user_id),
            user_agent: self.user_agent,
            created_at: self.created_at,
            expires_at: self.expires_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct VerificationCodeRow {
    code_id: Uuid,
    user_id: Uuid,
    purpose: String,
    code: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl VerificationCodeRow {
    fn into_code(self) -> IdentityResult<VerificationCode> {
        let purpose = CodePurpose::from_code(&self.purpose)
            .ok_or_else(|| IdentityError::Internal(format!("Unknown purpose: {}", self.purpose)))?;

        Ok(VerificationCode {
            code_id: CodeId::from_uuid(self.code_id),
            user_id: UserId::from_uuid(self.user_id),
            purpose,
            code: self.code,
            created_at: self.created_at,
            expires_at: self.expires_at,
        })
    }
}
