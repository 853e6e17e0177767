//! Credential Extraction Strategies
//!
//! Each route that authenticates a caller names its strategy explicitly
//! and dispatches to it; there is no global strategy registry. A strategy
//! only pulls the raw credential out of the request - verification belongs
//! to the use cases.

use std::collections::HashMap;

use axum::http::HeaderMap;
use serde_json::Value;

use crate::domain::value_object::provider_link::OAuthProvider;
use crate::error::{IdentityError, IdentityResult};
use platform::cookie::extract_cookie;

/// The pieces of a request a strategy may look at
pub struct RequestContext<'a> {
    pub headers: &'a HeaderMap,
    /// Parsed JSON body, when the route carries one
    pub body: Option<&'a Value>,
    /// Query parameters, when the route carries them
    pub query: Option<&'a HashMap<String, String>>,
}

impl<'a> RequestContext<'a> {
    pub fn from_headers(headers: &'a HeaderMap) -> Self {
        Self {
            headers,
            body: None,
            query: None,
        }
    }

    pub fn with_body(headers: &'a HeaderMap, body: &'a Value) -> Self {
        Self {
            headers,
            body: Some(body),
            query: None,
        }
    }

    pub fn with_query(headers: &'a HeaderMap, query: &'a HashMap<String, String>) -> Self {
        Self {
            headers,
            body: None,
            query: Some(query),
        }
    }
}

/// A raw credential pulled from a request, not yet verified
#[derive(Debug, Clone)]
pub enum Candidate {
    Password { email: String, password: String },
    BearerToken { token: String },
    ProviderCallback {
        provider: OAuthProvider,
        code: String,
        state: String,
    },
}

/// A way of pulling a credential out of a request
pub trait IdentityStrategy {
    fn extract_credential(&self, ctx: &RequestContext<'_>) -> IdentityResult<Candidate>;
}

// ============================================================================
// Password strategy (login body)
// ============================================================================

/// Reads `email` + `password` from the JSON body
pub struct PasswordStrategy;

impl IdentityStrategy for PasswordStrategy {
    fn extract_credential(&self, ctx: &RequestContext<'_>) -> IdentityResult<Candidate> {
        let body = ctx
            .body
            .ok_or_else(|| IdentityError::Validation("Request body is required".to_string()))?;

        let email = body
            .get("email")
            .and_then(Value::as_str)
            .ok_or_else(|| IdentityError::Validation("email is required".to_string()))?;

        let password = body
            .get("password")
            .and_then(Value::as_str)
            .ok_or_else(|| IdentityError::Validation("password is required".to_string()))?;

        Ok(Candidate::Password {
            email: email.to_string(),
            password: password.to_string(),
        })
    }
}

// ============================================================================
// Bearer token strategy (access cookie)
// ============================================================================

/// Reads the access token from its cookie
pub struct BearerTokenStrategy {
    cookie_name: String,
}

impl BearerTokenStrategy {
    pub fn new(cookie_name: impl Into<String>) -> Self {
        Self {
            cookie_name: cookie_name.into(),
        }
    }
}

impl IdentityStrategy for BearerTokenStrategy {
    fn extract_credential(&self, ctx: &RequestContext<'_>) -> IdentityResult<Candidate> {
        let token = extract_cookie(ctx.headers, &self.cookie_name)
            .ok_or_else(|| IdentityError::Token("missing access token cookie".to_string()))?;

        Ok(Candidate::BearerToken { token })
    }
}

// ============================================================================
// OAuth provider strategy (callback query)
// ============================================================================

/// Reads `code` + `state` from a provider callback's query string
pub struct OAuthProviderStrategy {
    provider: OAuthProvider,
}

impl OAuthProviderStrategy {
    pub fn new(provider: OAuthProvider) -> Self {
        Self { provider }
    }
}

impl IdentityStrategy for OAuthProviderStrategy {
    fn extract_credential(&self, ctx: &RequestContext<'_>) -> IdentityResult<Candidate> {
        let query = ctx
            .query
            .ok_or_else(|| IdentityError::Validation("Query string is required".to_string()))?;

        let code = query
            .get("code")
            .ok_or_else(|| IdentityError::Validation("code is required".to_string()))?;

        let state = query
            .get("state")
            .ok_or_else(|| IdentityError::Validation("state is required".to_string()))?;

        Ok(Candidate::ProviderCallback {
            provider: self.provider,
            code: code.clone(),
            state: state.clone(),
        })
    }
}
