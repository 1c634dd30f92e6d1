// ============================
// crates/backend-lib/src/auth/service.rs
// ============================
//! Authentication service interface.
use async_trait::async_trait;
use logincount_common::UserId;

use crate::error::AppError;
use crate::storage::User;

/// Outcome of a successful login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginResult {
    pub username: String,
    pub user_id: UserId,
    /// The user's counter after this login
    pub sign_in_count: i64,
    pub token: String,
}

#[async_trait]
pub trait AuthService: Send + Sync {
    /// Create an account with a hashed password and a zero counter
    async fn register(&self, username: &str, password: &str) -> Result<User, AppError>;

    /// Check credentials, bump the counter, notify observers and issue a token
    async fn login(&self, username: &str, password: &str) -> Result<LoginResult, AppError>;

    /// Resolve a presented token to the user id it was issued for
    fn verify_token(&self, token: &str) -> Result<UserId, AppError>;
}
