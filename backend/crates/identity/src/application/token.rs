//! Token Service
//!
//! Stateless signing and verification of the two bearer token kinds.
//! Access and refresh tokens use separate signing secrets AND separate
//! audiences, so one kind can never be replayed as the other even if the
//! secrets were ever set to the same value.
//!
//! The refresh token carries only the session id - not the user id or the
//! role - so a role change can never be smuggled through a stale refresh
//! token; the access token minted on refresh always reads the user's
//! current role.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::config::IdentityConfig;
use crate::domain::value_object::{
    ids::{SessionId, UserId},
    user_role::UserRole,
};
use crate::error::{IdentityError, IdentityResult};

/// Audience claim for access tokens
pub const ACCESS_AUDIENCE: &str = "worklane:access";

/// Audience claim for refresh tokens
pub const REFRESH_AUDIENCE: &str = "worklane:refresh";

/// Claims carried by an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// User id
    pub sub: String,
    /// Session id
    pub sid: String,
    /// Role at issuance time
    pub role: UserRole,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

impl AccessClaims {
    pub fn user_id(&self) -> IdentityResult<UserId> {
        parse_id(&self.sub).map(UserId::from_uuid)
    }

    pub fn session_id(&self) -> IdentityResult<SessionId> {
        parse_id(&self.sid).map(SessionId::from_uuid)
    }
}

/// Claims carried by a refresh token: only the session reference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// Session id
    pub sid: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

impl RefreshClaims {
    pub fn session_id(&self) -> IdentityResult<SessionId> {
        parse_id(&self.sid).map(SessionId::from_uuid)
    }
}

fn parse_id(raw: &str) -> IdentityResult<Uuid> {
    raw.parse()
        .map_err(|_| IdentityError::Token(format!("malformed id claim: {raw}")))
}

/// A freshly issued access + refresh token pair
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Stateless token signer/verifier
pub struct TokenService {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(config: &IdentityConfig) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(config.access_token_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.access_token_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(config.refresh_token_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(config.refresh_token_secret.as_bytes()),
            access_ttl: config.access_token_ttl,
            refresh_ttl: config.refresh_token_ttl,
        }
    }

    /// Issue an access token bound to a user, session, and role
    pub fn issue_access(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
        role: UserRole,
    ) -> IdentityResult<String> {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: user_id.to_string(),
            sid: session_id.to_string(),
            role,
            aud: ACCESS_AUDIENCE.to_string(),
            iat: now.timestamp(),
            exp: (now + self.access_ttl).timestamp(),
        };

        encode(&Header::default(), &claims, &self.access_encoding)
            .map_err(|e| IdentityError::Internal(format!("Failed to sign access token: {e}")))
    }

    /// Issue a refresh token carrying only the session id
    pub fn issue_refresh(&self, session_id: &SessionId) -> IdentityResult<String> {
        let now = Utc::now();
        let claims = RefreshClaims {
            sid: session_id.to_string(),
            aud: REFRESH_AUDIENCE.to_string(),
            iat: now.timestamp(),
            exp: (now + self.refresh_ttl).timestamp(),
        };

        encode(&Header::default(), &claims, &self.refresh_encoding)
            .map_err(|e| IdentityError::Internal(format!("Failed to sign refresh token: {e}")))
    }

    /// Issue both tokens for a session belonging to `user_id` with `role`
    pub fn issue_pair(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
        role: UserRole,
    ) -> IdentityResult<TokenPair> {
        Ok(TokenPair {
            access_token: self.issue_access(user_id, session_id, role)?,
            refresh_token: self.issue_refresh(session_id)?,
        })
    }

    /// Verify an access token: signature + expiry + audience
    pub fn verify_access(&self, token: &str) -> IdentityResult<AccessClaims> {
        let data = decode::<AccessClaims>(token, &self.access_decoding, &validation(ACCESS_AUDIENCE))
            .map_err(|e| IdentityError::Token(e.to_string()))?;
        Ok(data.claims)
    }

    /// Verify a refresh token: signature + expiry + audience
    pub fn verify_refresh(&self, token: &str) -> IdentityResult<RefreshClaims> {
        let data =
            decode::<RefreshClaims>(token, &self.refresh_decoding, &validation(REFRESH_AUDIENCE))
                .map_err(|e| IdentityError::Token(e.to_string()))?;
        Ok(data.claims)
    }

    /// Issue an access token that is already expired (test hook)
    #[cfg(test)]
    pub fn issue_expired_access(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
        role: UserRole,
    ) -> String {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: user_id.to_string(),
            sid: session_id.to_string(),
            role,
            aud: ACCESS_AUDIENCE.to_string(),
            iat: (now - Duration::hours(2)).timestamp(),
            exp: (now - Duration::hours(1)).timestamp(),
        };
        encode(&Header::default(), &claims, &self.access_encoding).unwrap()
    }
}

/// Shared validation settings: HS256, exact expiry (no leeway), audience pinned
fn validation(audience: &str) -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_audience(&[audience]);
    validation
}
