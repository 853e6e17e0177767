//! OAuth Provider Gateway
//!
//! Talks to the external identity providers: builds the authorization
//! redirect (with a one-shot CSRF state), exchanges the callback code for
//! an access token, and fetches + normalizes the user info into a
//! [`ProviderIdentity`].

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use crate::application::link_identity::ProviderIdentity;
use crate::domain::value_object::provider_link::OAuthProvider;
use crate::error::{IdentityError, IdentityResult};
use platform::crypto::random_token;

/// One-shot states expire after 10 minutes
const STATE_MAX_AGE_SECS: i64 = 600;

/// Provider gateway port
#[trait_variant::make(ProviderGateway: Send)]
pub trait LocalProviderGateway {
    /// Build the provider's authorization URL, registering a one-shot state
    fn authorization_url(&self, provider: OAuthProvider) -> IdentityResult<String>;

    /// Validate the state, exchange the code, and fetch the identity
    async fn exchange(
        &self,
        provider: OAuthProvider,
        code: &str,
        state: &str,
    ) -> IdentityResult<ProviderIdentity>;
}

/// Per-provider OAuth client settings
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

/// Pending authorization state for CSRF protection
#[derive(Debug, Clone)]
struct PendingState {
    provider: OAuthProvider,
    created_at: DateTime<Utc>,
}

impl PendingState {
    fn is_expired(&self) -> bool {
        Utc::now() - self.created_at > Duration::seconds(STATE_MAX_AGE_SECS)
    }
}

/// HTTP gateway for Google and LinkedIn
pub struct HttpProviderGateway {
    providers: HashMap<OAuthProvider, ProviderSettings>,
    http: reqwest::Client,
    states: RwLock<HashMap<String, PendingState>>,
}

impl HttpProviderGateway {
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
            http: reqwest::Client::new(),
            states: RwLock::new(HashMap::new()),
        }
    }

    /// Register a provider's client settings
    pub fn register(&mut self, provider: OAuthProvider, settings: ProviderSettings) {
        self.providers.insert(provider, settings);
    }

    fn settings(&self, provider: OAuthProvider) -> IdentityResult<&ProviderSettings> {
        self.providers.get(&provider).ok_or_else(|| {
            IdentityError::Internal(format!("Provider {provider} is not configured"))
        })
    }

    fn validate_state(&self, provider: OAuthProvider, state: &str) -> IdentityResult<()> {
        let mut states = self.states.write().unwrap();

        // Consume the state whatever happens next
        let pending = states
            .remove(state)
            .ok_or_else(|| IdentityError::Validation("Invalid or expired state".to_string()))?;

        if pending.is_expired() || pending.provider != provider {
            return Err(IdentityError::Validation(
                "Invalid or expired state".to_string(),
            ));
        }

        // Opportunistically drop other stale entries
        states.retain(|_, s| !s.is_expired());

        Ok(())
    }

    fn auth_endpoint(provider: OAuthProvider) -> &'static str {
        match provider {
            OAuthProvider::Google => "https://accounts.google.com/o/oauth2/v2/auth",
            OAuthProvider::LinkedIn => "https://www.linkedin.com/oauth/v2/authorization",
        }
    }

    fn token_endpoint(provider: OAuthProvider) -> &'static str {
        match provider {
            OAuthProvider::Google => "https://oauth2.googleapis.com/token",
            OAuthProvider::LinkedIn => "https://www.linkedin.com/oauth/v2/accessToken",
        }
    }

    fn userinfo_endpoint(provider: OAuthProvider) -> &'static str {
        match provider {
            OAuthProvider::Google => "https://www.googleapis.com/oauth2/v3/userinfo",
            OAuthProvider::LinkedIn => "https://api.linkedin.com/v2/userinfo",
        }
    }

    fn scopes(provider: OAuthProvider) -> &'static str {
        match provider {
            OAuthProvider::Google => "openid email profile",
            OAuthProvider::LinkedIn => "openid email profile",
        }
    }
}

impl Default for HttpProviderGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderGateway for HttpProviderGateway {
    fn authorization_url(&self, provider: OAuthProvider) -> IdentityResult<String> {
        let settings = self.settings(provider)?;

        let state = random_token(32);
        self.states.write().unwrap().insert(
            state.clone(),
            PendingState {
                provider,
                created_at: Utc::now(),
            },
        );

        let url = reqwest::Url::parse_with_params(
            Self::auth_endpoint(provider),
            &[
                ("client_id", settings.client_id.as_str()),
                ("redirect_uri", settings.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", Self::scopes(provider)),
                ("state", state.as_str()),
            ],
        )
        .map_err(|e| IdentityError::Internal(format!("Failed to build auth URL: {e}")))?;

        Ok(url.into())
    }

    async fn exchange(
        &self,
        provider: OAuthProvider,
        code: &str,
        state: &str,
    ) -> IdentityResult<ProviderIdentity> {
        self.validate_state(provider, state)?;

        let settings = self.settings(provider)?;

        let token: TokenResponse = self
            .http
            .post(Self::token_endpoint(provider))
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", settings.client_id.as_str()),
                ("client_secret", settings.client_secret.as_str()),
                ("redirect_uri", settings.redirect_uri.as_str()),
            ])
            .send()
            .await
            .map_err(|e| IdentityError::Internal(format!("Token exchange failed: {e}")))?
            .error_for_status()
            .map_err(|e| IdentityError::Validation(format!("Provider rejected the code: {e}")))?
            .json()
            .await
            .map_err(|e| IdentityError::Internal(format!("Malformed token response: {e}")))?;

        let info: OidcUserInfo = self
            .http
            .get(Self::userinfo_endpoint(provider))
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(|e| IdentityError::Internal(format!("Userinfo fetch failed: {e}")))?
            .error_for_status()
            .map_err(|e| IdentityError::Internal(format!("Userinfo fetch rejected: {e}")))?
            .json()
            .await
            .map_err(|e| IdentityError::Internal(format!("Malformed userinfo response: {e}")))?;

        let email = info.email.ok_or_else(|| {
            IdentityError::Validation("Identity provider did not supply a usable email".to_string())
        })?;

        Ok(ProviderIdentity {
            provider,
            provider_id: info.sub,
            email,
            display_name: info.name,
        })
    }
}

/// Token endpoint response (both providers)
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// OpenID Connect userinfo shape shared by Google and LinkedIn
#[derive(Debug, Deserialize)]
struct OidcUserInfo {
    sub: String,
    email: Option<String>,
    name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway() -> HttpProviderGateway {
        let mut gateway = HttpProviderGateway::new();
        gateway.register(
            OAuthProvider::Google,
            ProviderSettings {
                client_id: "google-client-id".to_string(),
                client_secret: "google-secret".to_string(),
                redirect_uri: "http://localhost:8000/api/v1/auth/oauth/google/callback"
                    .to_string(),
            },
        );
        gateway
    }

    #[test]
    fn test_authorization_url() {
        let gateway = gateway();
        let url = ProviderGateway::authorization_url(&gateway, OAuthProvider::Google).unwrap();

        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(url.contains("client_id=google-client-id"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("state="));
    }

    #[test]
    fn test_unconfigured_provider() {
        let gateway = gateway();
        assert!(ProviderGateway::authorization_url(&gateway, OAuthProvider::LinkedIn).is_err());
    }

    #[test]
    fn test_state_is_one_shot() {
        let gateway = gateway();
        let url = ProviderGateway::authorization_url(&gateway, OAuthProvider::Google).unwrap();

        let state = reqwest::Url::parse(&url)
            .unwrap()
            .query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.to_string())
            .unwrap();

        assert!(gateway.validate_state(OAuthProvider::Google, &state).is_ok());
        // Consumed: second use fails
        assert!(gateway.validate_state(OAuthProvider::Google, &state).is_err());
    }

    #[test]
    fn test_state_provider_mismatch() {
        let mut gateway = gateway();
        gateway.register(
            OAuthProvider::LinkedIn,
            ProviderSettings {
                client_id: "li-client-id".to_string(),
                client_secret: "li-secret".to_string(),
                redirect_uri: "http://localhost:8000/api/v1/auth/oauth/linkedin/callback"
                    .to_string(),
            },
        );

        let url = ProviderGateway::authorization_url(&gateway, OAuthProvider::Google).unwrap();
        let state = reqwest::Url::parse(&url)
            .unwrap()
            .query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.to_string())
            .unwrap();

        assert!(
            gateway
                .validate_state(OAuthProvider::LinkedIn, &state)
                .is_err()
        );
    }
}
