//! Identity Error Types
//!
//! This module provides identity-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.
//!
//! Every variant is terminal for the current request; nothing here is
//! retried internally.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Identity-specific result type alias
pub type IdentityResult<T> = Result<T, IdentityError>;

/// Identity-specific error variants
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Malformed input (bad role string, password mismatch, etc.)
    #[error("{0}")]
    Validation(String),

    /// Bad credentials. Deliberately the same message whether the email is
    /// unknown or the password is wrong, so responses carry no account
    /// enumeration signal.
    #[error("Invalid email or password provided")]
    InvalidCredentials,

    /// A submitted TOTP code did not validate
    #[error("Invalid MFA code")]
    InvalidMfaCode,

    /// Token failed signature, expiry, or audience checks.
    /// The inner detail is for logs only and never serialized.
    #[error("Invalid or expired token")]
    Token(String),

    /// The session referenced by a token is past its expiry
    #[error("Session expired")]
    SessionExpired,

    /// MFA verification was attempted for a user who never enrolled
    #[error("MFA is not enrolled for this user")]
    MfaNotEnrolled,

    /// User/session/code absent
    #[error("{0} not found")]
    NotFound(String),

    /// Duplicate email or similar state conflict
    #[error("{0}")]
    Conflict(String),

    /// Too many password-reset requests inside the rolling window
    #[error("Too many requests, try again later")]
    RateLimited,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IdentityError {
    /// Shorthand for [`IdentityError::NotFound`]
    pub fn not_found(what: impl Into<String>) -> Self {
        IdentityError::NotFound(what.into())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            IdentityError::Validation(_) | IdentityError::InvalidMfaCode => StatusCode::BAD_REQUEST,
            IdentityError::InvalidCredentials
            | IdentityError::Token(_)
            | IdentityError::SessionExpired => StatusCode::UNAUTHORIZED,
            IdentityError::MfaNotEnrolled => StatusCode::FORBIDDEN,
            IdentityError::NotFound(_) => StatusCode::NOT_FOUND,
            IdentityError::Conflict(_) => StatusCode::CONFLICT,
            IdentityError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            IdentityError::Database(_) | IdentityError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            IdentityError::Validation(_) | IdentityError::InvalidMfaCode => ErrorKind::BadRequest,
            IdentityError::InvalidCredentials
            | IdentityError::Token(_)
            | IdentityError::SessionExpired => ErrorKind::Unauthorized,
            IdentityError::MfaNotEnrolled => ErrorKind::Forbidden,
            IdentityError::NotFound(_) => ErrorKind::NotFound,
            IdentityError::Conflict(_) => ErrorKind::Conflict,
            IdentityError::RateLimited => ErrorKind::TooManyRequests,
            IdentityError::Database(_) | IdentityError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    /// Convert to AppError.
    ///
    /// Server-side errors are replaced by a generic message so internals
    /// never leak into a response body.
    pub fn to_app_error(&self) -> AppError {
        match self {
            IdentityError::Database(_) | IdentityError::Internal(_) => {
                AppError::internal("Internal server error")
            }
            other => AppError::new(other.kind(), other.to_string()),
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            IdentityError::Database(e) => {
                tracing::error!(error = %e, "Identity database error");
            }
            IdentityError::Internal(msg) => {
                tracing::error!(message = %msg, "Identity internal error");
            }
            IdentityError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            IdentityError::Token(detail) => {
                tracing::warn!(detail = %detail, "Token rejected");
            }
            IdentityError::RateLimited => {
                tracing::warn!("Rate limit hit");
            }
            _ => {
                tracing::debug!(error = %self, "Identity error");
            }
        }
    }
}

impl IntoResponse for IdentityError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for IdentityError {
    fn from(err: AppError) -> Self {
        match err.kind() {
            ErrorKind::BadRequest | ErrorKind::UnprocessableEntity => {
                IdentityError::Validation(err.message().to_string())
            }
            ErrorKind::NotFound => IdentityError::NotFound(err.message().to_string()),
            ErrorKind::Conflict => IdentityError::Conflict(err.message().to_string()),
            ErrorKind::TooManyRequests => IdentityError::RateLimited,
            _ => IdentityError::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            IdentityError::Validation("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            IdentityError::InvalidCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            IdentityError::Token("detail".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            IdentityError::MfaNotEnrolled.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            IdentityError::not_found("User").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            IdentityError::Conflict("dup".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            IdentityError::RateLimited.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            IdentityError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_token_detail_not_in_message() {
        let err = IdentityError::Token("ExpiredSignature".into());
        assert_eq!(err.to_string(), "Invalid or expired token");
    }

    #[test]
    fn test_internal_errors_do_not_leak() {
        let err = IdentityError::Internal("connection string postgres://user:pw".into());
        let app = err.to_app_error();
        assert_eq!(app.message(), "Internal server error");
    }

    #[test]
    fn test_app_error_conversion() {
        let err: IdentityError = AppError::bad_request("Invalid email format").into();
        assert!(matches!(err, IdentityError::Validation(_)));

        let err: IdentityError = AppError::conflict("Duplicate").into();
        assert!(matches!(err, IdentityError::Conflict(_)));
    }
}
