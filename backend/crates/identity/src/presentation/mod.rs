//! Presentation Layer
//!
//! HTTP handlers, DTOs, router, middleware, and credential strategies.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod strategy;

pub use handlers::IdentityAppState;
pub use middleware::{AuthMiddlewareState, CurrentUser, require_auth};
pub use router::{identity_router, identity_router_generic};
pub use strategy::{
    BearerTokenStrategy, Candidate, IdentityStrategy, OAuthProviderStrategy, PasswordStrategy,
    RequestContext,
};
