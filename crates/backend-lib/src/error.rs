// crates/backend-lib/src/error.rs

//! Central error type + Axum and GraphQL integration.
use async_graphql::ErrorExtensions;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Why a login or a presented token was refused
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthFailure {
    #[error("login not possible")]
    UnknownUser,

    #[error("wrong password")]
    WrongPassword,

    #[error("login not possible: username matches more than one account")]
    AmbiguousUser,

    #[error("invalid token: {0}")]
    InvalidToken(String),
}

/// Application error types with error codes and context
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Username already taken: {0}")]
    ConstraintViolation(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(AuthFailure),

    #[error("Not authorized")]
    NotAuthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Password hashing error: {0}")]
    Hashing(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::AuthenticationFailed(_) | AppError::NotAuthorized => {
                StatusCode::UNAUTHORIZED
            },
            AppError::ConstraintViolation(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::ConstraintViolation(_) => "CONSTRAINT_VIOLATION",
            AppError::AuthenticationFailed(failure) => match failure {
                AuthFailure::UnknownUser | AuthFailure::InvalidToken(_) => "UNAUTHENTICATED",
                AuthFailure::WrongPassword => "WRONGPASSWORD",
                AuthFailure::AmbiguousUser => "LOGINNOTPOSSIBLE",
            },
            AppError::NotAuthorized => "NOTAUTHORIZED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::InvalidInput(_) => "BAD_USER_INPUT",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Database(_)
            | AppError::Token(_)
            | AppError::Hashing(_)
            | AppError::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Get a sanitized message suitable for production use
    pub fn sanitized_message(&self) -> String {
        match self {
            AppError::ConstraintViolation(_) => "Username already taken".to_string(),
            AppError::AuthenticationFailed(AuthFailure::WrongPassword) => {
                "Wrong password".to_string()
            },
            AppError::AuthenticationFailed(_) => "User is not authenticated".to_string(),
            AppError::NotAuthorized => "Not Authorized".to_string(),
            AppError::NotFound(_) => "Resource not found".to_string(),
            AppError::InvalidInput(_) => "Invalid input provided".to_string(),
            AppError::Config(_) => "Server misconfigured".to_string(),
            _ => "An internal server error occurred".to_string(),
        }
    }

    /// Message shown to API callers: detailed in development, sanitized in production
    pub fn client_message(&self) -> String {
        if cfg!(debug_assertions) {
            self.to_string()
        } else {
            self.sanitized_message()
        }
    }

    pub fn auth(failure: AuthFailure) -> Self {
        AppError::AuthenticationFailed(failure)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = serde_json::json!({
            "error": {
                "code": self.error_code(),
                "message": self.client_message(),
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

/// GraphQL errors carry `code` and `status` extensions next to the message
impl ErrorExtensions for AppError {
    fn extend(&self) -> async_graphql::Error {
        let code = self.error_code();
        let status = i32::from(self.status_code().as_u16());
        async_graphql::Error::new(self.client_message()).extend_with(|_, e| {
            e.set("code", code.to_string());
            e.set("status", status);
        })
    }
}

impl From<figment::Error> for AppError {
    fn from(err: figment::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("blocking task failed: {err}"))
    }
}
