//! Identity & Session Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Business logic, entities, repository traits
//! - `application/` - Use cases and application services
//! - `infra/` - Database implementations, SMTP, OAuth gateway
//! - `presentation/` - HTTP handlers, DTOs, router, middleware
//!
//! ## Features
//! - Credential registration/login with email verification
//! - Refresh-token-backed sessions with sliding-window rotation
//! - TOTP-based MFA (Google Authenticator compatible)
//! - OAuth account linking (Google, LinkedIn)
//! - Role selection with full session rotation
//!
//! ## Security Model
//! - Passwords hashed with Argon2id (NIST SP 800-63B compliant)
//! - Access and refresh tokens use separate secrets and audiences
//! - Refresh tokens carry only a session id; deleting the session kills them
//! - Password reset revokes every session for the user

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::IdentityConfig;
pub use error::{IdentityError, IdentityResult};
pub use infra::postgres::PgIdentityRepository;
pub use presentation::router::identity_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod handlers {
    pub use crate::presentation::handlers::*;
}

pub mod store {
    pub use crate::infra::postgres::PgIdentityRepository as IdentityStore;
}

pub mod router {
    pub use crate::presentation::router::*;
}

pub mod middleware {
    pub use crate::presentation::middleware::*;
}

#[cfg(test)]
mod tests;
