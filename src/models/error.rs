use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

use crate::core::TokenError;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub error: String,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("user store unavailable: {0}")]
    Unavailable(String),
    #[error("duplicate value: {0}")]
    Duplicate(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err.as_database_error() {
            Some(db) if db.is_unique_violation() => StoreError::Duplicate(db.message().to_string()),
            _ => StoreError::Unavailable(err.to_string()),
        }
    }
}

/// Reasons the auth gate rejects a call.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Please authenticate")]
    Unauthenticated,
    #[error("Invalid access token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("You are not allowed to perform this action")]
    Forbidden,
    #[error("User not found")]
    AccountNotFound,
    #[error("Your account is inactive")]
    AccountInactive,
    #[error("Your account has been deleted")]
    AccountGone,
    #[error("User store unavailable")]
    StoreUnavailable(String),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Unauthenticated | AuthError::InvalidToken | AuthError::TokenExpired => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::Forbidden | AuthError::AccountInactive => StatusCode::FORBIDDEN,
            AuthError::AccountNotFound => StatusCode::NOT_FOUND,
            AuthError::AccountGone => StatusCode::GONE,
            AuthError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn message_key(&self) -> &'static str {
        match self {
            AuthError::Unauthenticated => "errorMessages.needAuthentication",
            AuthError::InvalidToken => "errorMessages.invalidAccessToken",
            AuthError::TokenExpired => "errorMessages.tokenExpire",
            AuthError::Forbidden => "errorMessages.authenticationFailed",
            AuthError::AccountNotFound => "errorMessages.userIdNotFound",
            AuthError::AccountInactive => "errorMessages.accountInactive",
            AuthError::AccountGone => "errorMessages.accountDeleted",
            AuthError::StoreUnavailable(_) => "errorMessages.storeUnavailable",
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => AuthError::TokenExpired,
            TokenError::InvalidSignature | TokenError::Encoding(_) => AuthError::InvalidToken,
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        AuthError::StoreUnavailable(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error("User not found")]
    UserNotFound,
    #[error("Incorrect password")]
    IncorrectPassword,
    #[error("Invalid request method")]
    MethodNotAllowed,
    #[error(transparent)]
    InvalidBody(#[from] JsonRejection),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(err: bcrypt::BcryptError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Auth(e) => (e.status(), e.message_key()),
            AppError::Store(StoreError::Duplicate(_)) => {
                (StatusCode::CONFLICT, "errorMessages.alreadyExists")
            }
            AppError::Store(StoreError::Unavailable(_)) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "errorMessages.storeUnavailable",
            ),
            AppError::Token(_) | AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "errorMessages.internalError",
            ),
            AppError::UserNotFound => (StatusCode::NOT_FOUND, "errorMessages.userNotFound"),
            AppError::IncorrectPassword => {
                (StatusCode::UNAUTHORIZED, "errorMessages.incorrectPassword")
            }
            AppError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                "errorMessages.invalidRequestMethod",
            ),
            AppError::InvalidBody(rejection) => (rejection.status(), "errorMessages.invalidRequest"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, key) = self.parts();
        let message = match &self {
            AppError::Store(StoreError::Duplicate(_)) => "Already exists".to_string(),
            AppError::Auth(AuthError::StoreUnavailable(detail))
            | AppError::Store(StoreError::Unavailable(detail)) => {
                error!("{}: {}", key, detail);
                "User store unavailable".to_string()
            }
            AppError::Internal(detail) => {
                error!("{}: {}", key, detail);
                "Internal error".to_string()
            }
            AppError::Token(e) => {
                error!("{}: {}", key, e);
                "Internal error".to_string()
            }
            _ => self.to_string(),
        };

        let body = ErrorResponse {
            status: status.as_u16(),
            error: key.to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}
