//! Identity Router

use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use std::sync::Arc;

use crate::application::config::IdentityConfig;
use crate::application::mailer::MailSender;
use crate::application::token::TokenService;
use crate::domain::repository::{SessionRepository, UserRepository, VerificationCodeRepository};
use crate::infra::oauth_gateway::{HttpProviderGateway, ProviderGateway};
use crate::infra::postgres::PgIdentityRepository;
use crate::infra::smtp::SmtpMailer;
use crate::presentation::handlers::{self, IdentityAppState};
use crate::presentation::middleware::{AuthMiddlewareState, require_auth};

/// Create the identity router with the production infrastructure
pub fn identity_router(
    repo: PgIdentityRepository,
    mailer: SmtpMailer,
    oauth: HttpProviderGateway,
    config: IdentityConfig,
) -> Router {
    identity_router_generic(repo, mailer, oauth, config)
}

/// Create an identity router for any repository/mailer/gateway implementation
pub fn identity_router_generic<R, M, P>(
    repo: R,
    mailer: M,
    oauth: P,
    config: IdentityConfig,
) -> Router
where
    R: UserRepository + SessionRepository + VerificationCodeRepository + Clone + Send + Sync + 'static,
    M: MailSender + Send + Sync + 'static,
    P: ProviderGateway + Send + Sync + 'static,
{
    let tokens = Arc::new(TokenService::new(&config));
    let config = Arc::new(config);
    let repo = Arc::new(repo);

    let state = IdentityAppState {
        repo: repo.clone(),
        mailer: Arc::new(mailer),
        oauth: Arc::new(oauth),
        tokens: tokens.clone(),
        config: config.clone(),
    };

    let auth_state = AuthMiddlewareState {
        repo,
        tokens,
        config,
    };

    let protected = Router::new()
        .route("/auth/logout", post(handlers::logout::<R, M, P>))
        .route("/mfa/setup", post(handlers::mfa_setup::<R, M, P>))
        .route("/mfa/verify", post(handlers::mfa_verify::<R, M, P>))
        .route("/mfa/revoke", post(handlers::mfa_revoke::<R, M, P>))
        .route("/user/me", get(handlers::me::<R, M, P>))
        .route("/user/role", put(handlers::update_role::<R, M, P>))
        .route_layer(middleware::from_fn_with_state(
            auth_state,
            require_auth::<R>,
        ));

    Router::new()
        .route("/auth/register", post(handlers::register::<R, M, P>))
        .route("/auth/login", post(handlers::login::<R, M, P>))
        .route("/auth/refresh", post(handlers::refresh::<R, M, P>))
        .route("/auth/verify-email", post(handlers::verify_email::<R, M, P>))
        .route(
            "/auth/forgot-password",
            post(handlers::forgot_password::<R, M, P>),
        )
        .route(
            "/auth/reset-password",
            post(handlers::reset_password::<R, M, P>),
        )
        .route("/auth/oauth/{provider}", get(handlers::oauth_start::<R, M, P>))
        .route(
            "/auth/oauth/{provider}/callback",
            get(handlers::oauth_callback::<R, M, P>),
        )
        .route(
            "/mfa/verify-login",
            post(handlers::mfa_verify_login::<R, M, P>),
        )
        .merge(protected)
        .with_state(state)
}
