//! Application Configuration
//!
//! Configuration for the identity application layer.

use chrono::Duration;

use platform::crypto::random_token;
use platform::rate_limit::RateLimitConfig;

/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

/// Identity application configuration
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    /// Signing secret for access tokens
    pub access_token_secret: String,
    /// Signing secret for refresh tokens (separate from access)
    pub refresh_token_secret: String,
    /// Access token TTL (default 7 days)
    pub access_token_ttl: Duration,
    /// Refresh token / session TTL (default 30 days)
    pub refresh_token_ttl: Duration,
    /// Remaining session validity at or below which a refresh call
    /// re-issues the refresh token and extends the session (default 1 day)
    pub rotation_threshold: Duration,
    /// Access token cookie name, valid on all paths
    pub access_cookie_name: String,
    /// Refresh token cookie name, scoped to the refresh endpoint
    pub refresh_cookie_name: String,
    /// Path the refresh cookie is scoped to
    pub refresh_cookie_path: String,
    /// Whether to require Secure cookies (production)
    pub cookie_secure: bool,
    /// SameSite policy (Strict in production, Lax otherwise)
    pub cookie_same_site: SameSite,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
    /// Frontend base URL for links embedded in emails and redirects
    pub frontend_url: String,
    /// Password-reset code issuance limit (2 codes per 3 minutes)
    pub reset_rate_limit: RateLimitConfig,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            access_token_secret: String::new(),
            refresh_token_secret: String::new(),
            access_token_ttl: Duration::days(7),
            refresh_token_ttl: Duration::days(30),
            rotation_threshold: Duration::days(1),
            access_cookie_name: "access_token".to_string(),
            refresh_cookie_name: "refresh_token".to_string(),
            refresh_cookie_path: "/api/v1/auth/refresh".to_string(),
            cookie_secure: true,
            cookie_same_site: SameSite::Strict,
            password_pepper: None,
            frontend_url: "http://localhost:3000".to_string(),
            reset_rate_limit: RateLimitConfig::new(2, 3 * 60),
        }
    }
}

impl IdentityConfig {
    /// Create config with random signing secrets (for development)
    pub fn with_random_secrets() -> Self {
        Self {
            access_token_secret: random_token(43),
            refresh_token_secret: random_token(43),
            ..Default::default()
        }
    }

    /// Create config for development (insecure cookie, lax same-site)
    pub fn development() -> Self {
        Self {
            cookie_secure: false,
            cookie_same_site: SameSite::Lax,
            ..Self::with_random_secrets()
        }
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }

    /// Link sent in account-confirmation emails
    pub fn email_verification_link(&self, code: &str) -> String {
        format!("{}/auth/confirm-account?code={}", self.frontend_url, code)
    }

    /// Link sent in password-reset emails
    pub fn password_reset_link(&self, code: &str, expires_at_ms: i64) -> String {
        format!(
            "{}/auth/reset-password?code={}&exp={}",
            self.frontend_url, code, expires_at_ms
        )
    }
}
