// ============================
// crates/backend-lib/src/api/caller.rs
// ============================
//! Request-scoped caller identity derived from the `authorization` header.
use axum::http::{header::AUTHORIZATION, HeaderMap};
use logincount_common::UserId;

use crate::auth::AuthService;
use crate::error::{AppError, AuthFailure};

/// Who is making the current request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    /// No token presented
    Anonymous,
    /// A valid token for this user
    User(UserId),
    /// A token was presented but failed verification
    Rejected(AuthFailure),
}

impl Caller {
    /// Resolve the caller from request headers
    pub fn from_headers(headers: &HeaderMap, auth: &dyn AuthService, legacy_quoted: bool) -> Self {
        let Some(value) = headers.get(AUTHORIZATION) else {
            return Caller::Anonymous;
        };
        let Ok(value) = value.to_str() else {
            return Caller::Rejected(AuthFailure::InvalidToken(
                "authorization header is not valid UTF-8".into(),
            ));
        };

        match extract_token(value, legacy_quoted) {
            None => Caller::Anonymous,
            Some(token) => match auth.verify_token(token) {
                Ok(user_id) => Caller::User(user_id),
                Err(AppError::AuthenticationFailed(failure)) => Caller::Rejected(failure),
                Err(other) => Caller::Rejected(AuthFailure::InvalidToken(other.to_string())),
            },
        }
    }

    /// The authenticated user id, or the error a protected operation reports
    pub fn require_user(&self) -> Result<UserId, AppError> {
        match self {
            Caller::User(id) => Ok(*id),
            Caller::Anonymous => Err(AppError::NotAuthorized),
            Caller::Rejected(failure) => Err(AppError::auth(failure.clone())),
        }
    }
}

/// Pull the token out of an `authorization` header value.
///
/// Accepts `Bearer <token>` (any case) and a bare token. With
/// `legacy_quoted` set, one pair of surrounding double quotes is removed.
/// Returns `None` when nothing is left.
pub fn extract_token(header: &str, legacy_quoted: bool) -> Option<&str> {
    let mut token = header.trim();
    if let Some(rest) = strip_prefix_ignore_ascii_case(token, "bearer") {
        // the scheme is a whole word: `Bearerabc` is a bare token
        if rest.is_empty() || rest.starts_with(char::is_whitespace) {
            token = rest.trim();
        }
    }
    if legacy_quoted && token.len() >= 2 && token.starts_with('"') && token.ends_with('"') {
        token = &token[1..token.len() - 1];
    }
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

fn strip_prefix_ignore_ascii_case<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    let head = value.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&value[prefix.len()..])
    } else {
        None
    }
}
