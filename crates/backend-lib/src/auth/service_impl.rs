use std::sync::Arc;

use async_trait::async_trait;
use logincount_common::UserId;
use metrics::counter;
use tracing::{debug, info, warn};

use crate::auth::{hash_password, verify_password, AuthService, HashCost, LoginObserver, LoginResult, TokenIssuer};
use crate::error::{AppError, AuthFailure};
use crate::metrics::{LOGIN_FAILED, LOGIN_SUCCEEDED, USER_CREATED};
use crate::storage::{User, UserStore};

pub struct DefaultAuth {
    store: Arc<dyn UserStore>,
    tokens: TokenIssuer,
    cost: HashCost,
    observer: Arc<dyn LoginObserver>,
}

impl DefaultAuth {
    pub fn new(
        store: Arc<dyn UserStore>,
        tokens: TokenIssuer,
        cost: HashCost,
        observer: Arc<dyn LoginObserver>,
    ) -> Self {
        Self {
            store,
            tokens,
            cost,
            observer,
        }
    }

    fn reject(&self, username: &str, failure: AuthFailure) -> AppError {
        warn!(%username, reason = %failure, "login rejected");
        counter!(LOGIN_FAILED).increment(1);
        AppError::auth(failure)
    }
}

#[async_trait]
impl AuthService for DefaultAuth {
    async fn register(&self, username: &str, password: &str) -> Result<User, AppError> {
        if username.trim().is_empty() {
            return Err(AppError::InvalidInput("username must not be empty".into()));
        }

        let plain = password.to_string();
        let cost = self.cost;
        let hash = tokio::task::spawn_blocking(move || hash_password(&plain, cost)).await??;

        let user = self.store.create_user(username, &hash).await?;
        counter!(USER_CREATED).increment(1);
        info!(user_id = user.id, username = %user.username, "user registered");
        Ok(user)
    }

    async fn login(&self, username: &str, password: &str) -> Result<LoginResult, AppError> {
        let mut matches = self.store.users_by_username(username).await?;
        let user = match matches.len() {
            0 => return Err(self.reject(username, AuthFailure::UnknownUser)),
            1 => matches.remove(0),
            _ => return Err(self.reject(username, AuthFailure::AmbiguousUser)),
        };

        let plain = password.to_string();
        let stored_hash = user.password_hash.clone();
        let password_ok =
            tokio::task::spawn_blocking(move || verify_password(&stored_hash, &plain)).await?;
        if !password_ok {
            return Err(self.reject(username, AuthFailure::WrongPassword));
        }

        let user = self.store.increment_sign_in_count(user.id).await?;
        let total = self.store.sum_of_sign_in_counts().await?;
        let token = self.tokens.issue(user.id)?;

        self.observer.on_login(total);
        counter!(LOGIN_SUCCEEDED).increment(1);
        info!(
            user_id = user.id,
            username = %user.username,
            sign_in_count = user.sign_in_count,
            total,
            "login succeeded"
        );

        Ok(LoginResult {
            username: user.username,
            user_id: user.id,
            sign_in_count: user.sign_in_count,
            token,
        })
    }

    fn verify_token(&self, token: &str) -> Result<UserId, AppError> {
        let user_id = self.tokens.verify(token)?;
        debug!(user_id, "token verified");
        Ok(user_id)
    }
}
