//! Provider Link Value Object
//!
//! An external identity attached to a local account: which OAuth provider,
//! and the subject identifier that provider assigned. Uniqueness of the
//! pair is per user only; no constraint spans users (two racing first-time
//! OAuth logins can each create an account — accepted, see data model).

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Supported OAuth identity providers
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OAuthProvider {
    #[display("google")]
    Google,
    #[display("linkedin")]
    LinkedIn,
}

impl OAuthProvider {
    pub const fn code(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "google",
            OAuthProvider::LinkedIn => "linkedin",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "google" => Some(OAuthProvider::Google),
            "linkedin" => Some(OAuthProvider::LinkedIn),
            _ => None,
        }
    }
}

/// One `(provider, provider_id)` pair attached to a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderLink {
    pub provider: OAuthProvider,
    pub provider_id: String,
}

impl ProviderLink {
    pub fn new(provider: OAuthProvider, provider_id: impl Into<String>) -> Self {
        Self {
            provider,
            provider_id: provider_id.into(),
        }
    }

    /// Whether this link refers to the given external identity
    pub fn matches(&self, provider: OAuthProvider, provider_id: &str) -> bool {
        self.provider == provider && self.provider_id == provider_id
    }
}
