//! HTTP Handlers

use std::collections::HashMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Redirect, Response};
use serde_json::Value;

use platform::client::extract_client_info;
use platform::cookie::CookieConfig;

use crate::application::config::IdentityConfig;
use crate::application::mailer::MailSender;
use crate::application::token::{TokenPair, TokenService};
use crate::application::{
    LinkIdentityUseCase, LoginInput, LoginUseCase, LogoutUseCase, MfaRevokeOutput, MfaSetupOutput,
    MfaUseCase, PasswordResetUseCase, RefreshUseCase, RegisterInput, RegisterUseCase,
    UpdateRoleUseCase, VerifyEmailUseCase,
};
use crate::domain::repository::{SessionRepository, UserRepository, VerificationCodeRepository};
use crate::domain::value_object::provider_link::OAuthProvider;
use crate::error::{IdentityError, IdentityResult};
use crate::infra::oauth_gateway::ProviderGateway;
use crate::presentation::dto::{
    ForgotPasswordRequest, LoginResponse, MessageResponse, MfaLoginRequest, MfaSetupResponse,
    MfaVerifyRequest, RegisterRequest, RegisterResponse, ResetPasswordRequest, UpdateRoleRequest,
    UpdateRoleResponse, UserResponse, VerifyEmailRequest,
};
use crate::presentation::middleware::CurrentUser;
use crate::presentation::strategy::{
    Candidate, IdentityStrategy, OAuthProviderStrategy, PasswordStrategy, RequestContext,
};

/// Shared state for identity handlers
pub struct IdentityAppState<R, M, P>
where
    R: UserRepository + SessionRepository + VerificationCodeRepository + Clone + Send + Sync + 'static,
    M: MailSender + Send + Sync + 'static,
    P: ProviderGateway + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub mailer: Arc<M>,
    pub oauth: Arc<P>,
    pub tokens: Arc<TokenService>,
    pub config: Arc<IdentityConfig>,
}

impl<R, M, P> Clone for IdentityAppState<R, M, P>
where
    R: UserRepository + SessionRepository + VerificationCodeRepository + Clone + Send + Sync + 'static,
    M: MailSender + Send + Sync + 'static,
    P: ProviderGateway + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            mailer: self.mailer.clone(),
            oauth: self.oauth.clone(),
            tokens: self.tokens.clone(),
            config: self.config.clone(),
        }
    }
}

// ============================================================================
// Register
// ============================================================================

/// POST /auth/register
pub async fn register<R, M, P>(
    State(state): State<IdentityAppState<R, M, P>>,
    Json(req): Json<RegisterRequest>,
) -> IdentityResult<impl IntoResponse>
where
    R: UserRepository + SessionRepository + VerificationCodeRepository + Clone + Send + Sync + 'static,
    M: MailSender + Send + Sync + 'static,
    P: ProviderGateway + Send + Sync + 'static,
{
    let use_case = RegisterUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.mailer.clone(),
        state.config.clone(),
    );

    let output = use_case
        .execute(RegisterInput {
            name: req.name,
            email: req.email,
            password: req.password,
            confirm_password: req.confirm_password,
            role: req.role,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully".to_string(),
            user: output.user,
        }),
    ))
}

// ============================================================================
// Login
// ============================================================================

/// POST /auth/login
///
/// Credentials are pulled from the body by the password strategy; the
/// response sets both token cookies, unless MFA defers issuance.
pub async fn login<R, M, P>(
    State(state): State<IdentityAppState<R, M, P>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> IdentityResult<Response>
where
    R: UserRepository + SessionRepository + VerificationCodeRepository + Clone + Send + Sync + 'static,
    M: MailSender + Send + Sync + 'static,
    P: ProviderGateway + Send + Sync + 'static,
{
    let ctx = RequestContext::with_body(&headers, &body);
    let Candidate::Password { email, password } = PasswordStrategy.extract_credential(&ctx)? else {
        return Err(IdentityError::Internal("Unexpected candidate".to_string()));
    };

    let client = extract_client_info(&headers, None);

    let use_case = LoginUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.tokens.clone(),
        state.config.clone(),
    );

    let output = use_case
        .execute(LoginInput {
            email,
            password,
            user_agent: client.user_agent,
        })
        .await?;

    if output.mfa_required {
        // Deferred: no tokens, no user payload
        return Ok(Json(LoginResponse {
            message: "Verify MFA to complete login".to_string(),
            mfa_required: true,
            user: None,
        })
        .into_response());
    }

    let tokens = output
        .tokens
        .ok_or_else(|| IdentityError::Internal("Missing token pair".to_string()))?;

    let response = Json(LoginResponse {
        message: "User logged in successfully".to_string(),
        mfa_required: false,
        user: Some(output.user),
    })
    .into_response();

    Ok(with_auth_cookies(response, &state.config, &tokens))
}

// ============================================================================
// Refresh
// ============================================================================

/// POST /auth/refresh
///
/// Reads the refresh cookie (scoped to this path). A token failure clears
/// both cookies so the client falls back to a full re-authentication.
pub async fn refresh<R, M, P>(
    State(state): State<IdentityAppState<R, M, P>>,
    headers: HeaderMap,
) -> Response
where
    R: UserRepository + SessionRepository + VerificationCodeRepository + Clone + Send + Sync + 'static,
    M: MailSender + Send + Sync + 'static,
    P: ProviderGateway + Send + Sync + 'static,
{
    let result = async {
        let token = platform::cookie::extract_cookie(&headers, &state.config.refresh_cookie_name)
            .ok_or_else(|| IdentityError::Token("missing refresh token cookie".to_string()))?;

        let use_case = RefreshUseCase::new(
            state.repo.clone(),
            state.repo.clone(),
            state.tokens.clone(),
            state.config.clone(),
        );

        use_case.execute(&token).await
    }
    .await;

    match result {
        Ok(output) => {
            let mut response = Json(MessageResponse {
                message: "Access token refreshed".to_string(),
            })
            .into_response();

            append_cookie(
                &mut response,
                access_cookie(&state.config).build_set_cookie(&output.access_token),
            );
            if let Some(refresh_token) = &output.refresh_token {
                append_cookie(
                    &mut response,
                    refresh_cookie(&state.config).build_set_cookie(refresh_token),
                );
            }
            response
        }
        Err(err) => {
            let clear = matches!(
                err,
                IdentityError::Token(_)
                    | IdentityError::SessionExpired
                    | IdentityError::NotFound(_)
            );
            let mut response = err.into_response();
            if clear {
                clear_auth_cookies(&mut response, &state.config);
            }
            response
        }
    }
}

// ============================================================================
// Email verification
// ============================================================================

/// POST /auth/verify-email
pub async fn verify_email<R, M, P>(
    State(state): State<IdentityAppState<R, M, P>>,
    Json(req): Json<VerifyEmailRequest>,
) -> IdentityResult<Json<MessageResponse>>
where
    R: UserRepository + SessionRepository + VerificationCodeRepository + Clone + Send + Sync + 'static,
    M: MailSender + Send + Sync + 'static,
    P: ProviderGateway + Send + Sync + 'static,
{
    let use_case = VerifyEmailUseCase::new(state.repo.clone(), state.repo.clone());
    use_case.execute(&req.code).await?;

    Ok(Json(MessageResponse {
        message: "Email verified successfully".to_string(),
    }))
}

// ============================================================================
// Password reset
// ============================================================================

/// POST /auth/forgot-password
pub async fn forgot_password<R, M, P>(
    State(state): State<IdentityAppState<R, M, P>>,
    Json(req): Json<ForgotPasswordRequest>,
) -> IdentityResult<Json<MessageResponse>>
where
    R: UserRepository + SessionRepository + VerificationCodeRepository + Clone + Send + Sync + 'static,
    M: MailSender + Send + Sync + 'static,
    P: ProviderGateway + Send + Sync + 'static,
{
    let use_case = PasswordResetUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
        state.mailer.clone(),
        state.config.clone(),
    );

    use_case.forgot(&req.email).await?;

    Ok(Json(MessageResponse {
        message: "Password reset email sent".to_string(),
    }))
}

/// POST /auth/reset-password
///
/// All sessions are revoked by the use case; the caller's cookies are
/// cleared as well so the client re-authenticates immediately.
pub async fn reset_password<R, M, P>(
    State(state): State<IdentityAppState<R, M, P>>,
    Json(req): Json<ResetPasswordRequest>,
) -> IdentityResult<Response>
where
    R: UserRepository + SessionRepository + VerificationCodeRepository + Clone + Send + Sync + 'static,
    M: MailSender + Send + Sync + 'static,
    P: ProviderGateway + Send + Sync + 'static,
{
    let use_case = PasswordResetUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
        state.mailer.clone(),
        state.config.clone(),
    );

    use_case.reset(&req.verification_code, req.password).await?;

    let mut response = Json(MessageResponse {
        message: "Password reset successfully".to_string(),
    })
    .into_response();
    clear_auth_cookies(&mut response, &state.config);

    Ok(response)
}

// ============================================================================
// Logout
// ============================================================================

/// POST /auth/logout (requires authentication)
pub async fn logout<R, M, P>(
    State(state): State<IdentityAppState<R, M, P>>,
    axum::Extension(current): axum::Extension<CurrentUser>,
) -> IdentityResult<Response>
where
    R: UserRepository + SessionRepository + VerificationCodeRepository + Clone + Send + Sync + 'static,
    M: MailSender + Send + Sync + 'static,
    P: ProviderGateway + Send + Sync + 'static,
{
    let use_case = LogoutUseCase::new(state.repo.clone());
    use_case.execute(&current.session_id).await?;

    let mut response = Json(MessageResponse {
        message: "User logged out successfully".to_string(),
    })
    .into_response();
    clear_auth_cookies(&mut response, &state.config);

    Ok(response)
}

// ============================================================================
// OAuth
// ============================================================================

/// GET /auth/oauth/{provider}
pub async fn oauth_start<R, M, P>(
    State(state): State<IdentityAppState<R, M, P>>,
    Path(provider): Path<String>,
) -> IdentityResult<Redirect>
where
    R: UserRepository + SessionRepository + VerificationCodeRepository + Clone + Send + Sync + 'static,
    M: MailSender + Send + Sync + 'static,
    P: ProviderGateway + Send + Sync + 'static,
{
    let provider = OAuthProvider::from_code(&provider)
        .ok_or_else(|| IdentityError::Validation("Unknown provider".to_string()))?;

    let url = state.oauth.authorization_url(provider)?;
    Ok(Redirect::temporary(&url))
}

/// GET /auth/oauth/{provider}/callback
///
/// Any failure redirects to the frontend error page rather than surfacing
/// a JSON error, since the caller here is a browser mid-redirect.
pub async fn oauth_callback<R, M, P>(
    State(state): State<IdentityAppState<R, M, P>>,
    Path(provider): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response
where
    R: UserRepository + SessionRepository + VerificationCodeRepository + Clone + Send + Sync + 'static,
    M: MailSender + Send + Sync + 'static,
    P: ProviderGateway + Send + Sync + 'static,
{
    let frontend = state.config.frontend_url.clone();

    let Some(provider) = OAuthProvider::from_code(&provider) else {
        return Redirect::temporary(&format!("{frontend}/auth/error")).into_response();
    };

    let result = async {
        let ctx = RequestContext::with_query(&headers, &query);
        let strategy = OAuthProviderStrategy::new(provider);

        let Candidate::ProviderCallback { code, state: csrf, .. } =
            strategy.extract_credential(&ctx)?
        else {
            return Err(IdentityError::Internal("Unexpected candidate".to_string()));
        };

        let identity = state.oauth.exchange(provider, &code, &csrf).await?;

        let client = extract_client_info(&headers, None);
        let use_case = LinkIdentityUseCase::new(
            state.repo.clone(),
            state.repo.clone(),
            state.tokens.clone(),
            state.config.clone(),
        );

        use_case.resolve(identity, client.user_agent).await
    }
    .await;

    match result {
        Ok(output) => {
            let response =
                Redirect::temporary(&format!("{frontend}/auth/success")).into_response();
            with_auth_cookies(response, &state.config, &output.tokens)
        }
        Err(err) => {
            tracing::warn!(provider = %provider, error = %err, "OAuth callback failed");
            let target = match &err {
                IdentityError::Validation(msg) if msg.contains("email") => {
                    format!("{frontend}/auth/error?reason=no_email")
                }
                _ => format!("{frontend}/auth/error"),
            };
            Redirect::temporary(&target).into_response()
        }
    }
}

// ============================================================================
// MFA (setup/verify/revoke require authentication)
// ============================================================================

/// POST /mfa/setup
pub async fn mfa_setup<R, M, P>(
    State(state): State<IdentityAppState<R, M, P>>,
    axum::Extension(current): axum::Extension<CurrentUser>,
) -> IdentityResult<Json<MfaSetupResponse>>
where
    R: UserRepository + SessionRepository + VerificationCodeRepository + Clone + Send + Sync + 'static,
    M: MailSender + Send + Sync + 'static,
    P: ProviderGateway + Send + Sync + 'static,
{
    let use_case = MfaUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.tokens.clone(),
        state.config.clone(),
    );

    let response = match use_case.generate_setup(&current.user_id).await? {
        MfaSetupOutput::AlreadyEnabled => MfaSetupResponse {
            message: "MFA already enabled".to_string(),
            secret: None,
            qr_image_url: None,
            otpauth_url: None,
        },
        MfaSetupOutput::Setup {
            secret,
            qr_image_base64,
            otpauth_url,
        } => MfaSetupResponse {
            message: "Scan the QR code or use the setup key".to_string(),
            secret: Some(secret),
            qr_image_url: Some(qr_image_base64),
            otpauth_url: Some(otpauth_url),
        },
    };

    Ok(Json(response))
}

/// POST /mfa/verify
pub async fn mfa_verify<R, M, P>(
    State(state): State<IdentityAppState<R, M, P>>,
    axum::Extension(current): axum::Extension<CurrentUser>,
    Json(req): Json<MfaVerifyRequest>,
) -> IdentityResult<Json<MessageResponse>>
where
    R: UserRepository + SessionRepository + VerificationCodeRepository + Clone + Send + Sync + 'static,
    M: MailSender + Send + Sync + 'static,
    P: ProviderGateway + Send + Sync + 'static,
{
    let use_case = MfaUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.tokens.clone(),
        state.config.clone(),
    );

    use_case
        .verify_setup(&current.user_id, &req.code, &req.secret)
        .await?;

    Ok(Json(MessageResponse {
        message: "MFA setup completed successfully".to_string(),
    }))
}

/// POST /mfa/revoke
pub async fn mfa_revoke<R, M, P>(
    State(state): State<IdentityAppState<R, M, P>>,
    axum::Extension(current): axum::Extension<CurrentUser>,
) -> IdentityResult<Json<MessageResponse>>
where
    R: UserRepository + SessionRepository + VerificationCodeRepository + Clone + Send + Sync + 'static,
    M: MailSender + Send + Sync + 'static,
    P: ProviderGateway + Send + Sync + 'static,
{
    let use_case = MfaUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.tokens.clone(),
        state.config.clone(),
    );

    let message = match use_case.revoke(&current.user_id).await? {
        MfaRevokeOutput::NotEnabled => "MFA is not enabled".to_string(),
        MfaRevokeOutput::Revoked => "MFA revoked successfully".to_string(),
    };

    Ok(Json(MessageResponse { message }))
}

/// POST /mfa/verify-login (caller not yet authenticated)
pub async fn mfa_verify_login<R, M, P>(
    State(state): State<IdentityAppState<R, M, P>>,
    headers: HeaderMap,
    Json(req): Json<MfaLoginRequest>,
) -> IdentityResult<Response>
where
    R: UserRepository + SessionRepository + VerificationCodeRepository + Clone + Send + Sync + 'static,
    M: MailSender + Send + Sync + 'static,
    P: ProviderGateway + Send + Sync + 'static,
{
    let client = extract_client_info(&headers, None);

    let use_case = MfaUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.tokens.clone(),
        state.config.clone(),
    );

    let output = use_case
        .verify_for_login(&req.code, &req.email, client.user_agent)
        .await?;

    let response = Json(LoginResponse {
        message: "User logged in successfully".to_string(),
        mfa_required: false,
        user: Some(output.user),
    })
    .into_response();

    Ok(with_auth_cookies(response, &state.config, &output.tokens))
}

// ============================================================================
// User (requires authentication)
// ============================================================================

/// GET /user/me
pub async fn me<R, M, P>(
    State(state): State<IdentityAppState<R, M, P>>,
    axum::Extension(current): axum::Extension<CurrentUser>,
) -> IdentityResult<Json<UserResponse>>
where
    R: UserRepository + SessionRepository + VerificationCodeRepository + Clone + Send + Sync + 'static,
    M: MailSender + Send + Sync + 'static,
    P: ProviderGateway + Send + Sync + 'static,
{
    let user = UserRepository::find_by_id(state.repo.as_ref(), &current.user_id)
        .await?
        .ok_or_else(|| IdentityError::not_found("User"))?;

    Ok(Json(UserResponse { user: user.view() }))
}

/// PUT /user/role
pub async fn update_role<R, M, P>(
    State(state): State<IdentityAppState<R, M, P>>,
    axum::Extension(current): axum::Extension<CurrentUser>,
    headers: HeaderMap,
    Json(req): Json<UpdateRoleRequest>,
) -> IdentityResult<Response>
where
    R: UserRepository + SessionRepository + VerificationCodeRepository + Clone + Send + Sync + 'static,
    M: MailSender + Send + Sync + 'static,
    P: ProviderGateway + Send + Sync + 'static,
{
    let client = extract_client_info(&headers, None);

    let use_case = UpdateRoleUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.tokens.clone(),
        state.config.clone(),
    );

    let output = use_case
        .execute(&current.user_id, &req.role, client.user_agent)
        .await?;

    let response = Json(UpdateRoleResponse {
        message: "User role updated successfully".to_string(),
        user: output.user,
    })
    .into_response();

    Ok(with_auth_cookies(response, &state.config, &output.tokens))
}

// ============================================================================
// Cookie helpers
// ============================================================================

fn access_cookie(config: &IdentityConfig) -> CookieConfig {
    CookieConfig {
        name: config.access_cookie_name.clone(),
        secure: config.cookie_secure,
        http_only: true,
        same_site: config.cookie_same_site,
        path: "/".to_string(),
        max_age_secs: Some(config.access_token_ttl.num_seconds()),
    }
}

fn refresh_cookie(config: &IdentityConfig) -> CookieConfig {
    CookieConfig {
        name: config.refresh_cookie_name.clone(),
        secure: config.cookie_secure,
        http_only: true,
        same_site: config.cookie_same_site,
        path: config.refresh_cookie_path.clone(),
        max_age_secs: Some(config.refresh_token_ttl.num_seconds()),
    }
}

fn append_cookie(response: &mut Response, cookie: String) {
    if let Ok(value) = header::HeaderValue::from_str(&cookie) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
}

fn with_auth_cookies(
    mut response: Response,
    config: &IdentityConfig,
    tokens: &TokenPair,
) -> Response {
    append_cookie(
        &mut response,
        access_cookie(config).build_set_cookie(&tokens.access_token),
    );
    append_cookie(
        &mut response,
        refresh_cookie(config).build_set_cookie(&tokens.refresh_token),
    );
    response
}

fn clear_auth_cookies(response: &mut Response, config: &IdentityConfig) {
    append_cookie(response, access_cookie(config).build_delete_cookie());
    append_cookie(response, refresh_cookie(config).build_delete_cookie());
}
