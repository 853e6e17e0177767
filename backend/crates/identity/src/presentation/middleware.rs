//! Auth Middleware
//!
//! Guards protected routes. Every request passing through here gets:
//! - the access token extracted via [`BearerTokenStrategy`] and verified,
//! - the referenced session confirmed to still exist and be unexpired
//!   (a deleted session kills its tokens instantly),
//! - one read of the User record to confirm the account still exists and
//!   to pick up its *current* role.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::application::config::IdentityConfig;
use crate::application::token::TokenService;
use crate::domain::repository::{SessionRepository, UserRepository};
use crate::domain::value_object::{
    ids::{SessionId, UserId},
    user_role::UserRole,
};
use crate::error::{IdentityError, IdentityResult};
use crate::presentation::strategy::{
    BearerTokenStrategy, Candidate, IdentityStrategy, RequestContext,
};

/// Middleware state
pub struct AuthMiddlewareState<R>
where
    R: UserRepository + SessionRepository + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub tokens: Arc<TokenService>,
    pub config: Arc<IdentityConfig>,
}

impl<R> Clone for AuthMiddlewareState<R>
where
    R: UserRepository + SessionRepository + Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            tokens: self.tokens.clone(),
            config: self.config.clone(),
        }
    }
}

/// Authenticated principal stored in request extensions
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: UserId,
    pub session_id: SessionId,
    /// Current role read from the user record, not the token
    pub role: UserRole,
}

/// Middleware that requires a valid access token bound to a live session
pub async fn require_auth<R>(
    State(state): State<AuthMiddlewareState<R>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, IdentityError>
where
    R: UserRepository + SessionRepository + Clone + Send + Sync + 'static,
{
    let current = authenticate(&state, req.headers()).await?;

    req.extensions_mut().insert(current);
    Ok(next.run(req).await)
}

async fn authenticate<R>(
    state: &AuthMiddlewareState<R>,
    headers: &axum::http::HeaderMap,
) -> IdentityResult<CurrentUser>
where
    R: UserRepository + SessionRepository + Clone + Send + Sync + 'static,
{
    let ctx = RequestContext::from_headers(headers);
    let strategy = BearerTokenStrategy::new(&state.config.access_cookie_name);

    let token = match strategy.extract_credential(&ctx)? {
        Candidate::BearerToken { token } => token,
        _ => return Err(IdentityError::Internal("Unexpected candidate".to_string())),
    };

    let claims = state.tokens.verify_access(&token)?;
    let user_id = claims.user_id()?;
    let session_id = claims.session_id()?;

    let session = SessionRepository::find_by_id(state.repo.as_ref(), &session_id)
        .await?
        .ok_or_else(|| IdentityError::Token("session no longer exists".to_string()))?;

    if session.is_expired() {
        return Err(IdentityError::SessionExpired);
    }

    let user = UserRepository::find_by_id(state.repo.as_ref(), &user_id)
        .await?
        .ok_or_else(|| IdentityError::Token("user no longer exists".to_string()))?;

    Ok(CurrentUser {
        user_id: user.user_id,
        session_id: session.session_id,
        role: user.role,
    })
}
