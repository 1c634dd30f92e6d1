// ============================
// crates/backend-lib/src/lib.rs
// ============================
//! Core functionality of the login-counter backend: credential store,
//! authentication, the GraphQL API and the push channel.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod metrics;
pub mod notifier;
pub mod storage;
pub mod ws_router;

use std::sync::Arc;

use axum::Router;

use crate::api::ApiState;
use crate::auth::{AuthService, DefaultAuth, HashCost, LoginObserver, TokenIssuer};
use crate::config::Settings;
use crate::error::AppError;
use crate::notifier::Notifier;
use crate::storage::{SqliteUserStore, UserStore};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Authentication service
    pub auth: Arc<dyn AuthService>,
    /// Credential store
    pub store: Arc<dyn UserStore>,
    /// Push-channel listeners
    pub notifier: Arc<Notifier>,
    /// Settings the state was built from
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Validate settings and open the SQLite database they point at
    pub fn new(settings: Settings) -> Result<Self, AppError> {
        settings.validate()?;
        let store = Arc::new(SqliteUserStore::open(&settings.database_path)?);
        Ok(Self::from_parts(settings, store))
    }

    /// Wire the services around an already opened store
    pub fn from_parts(settings: Settings, store: Arc<dyn UserStore>) -> Self {
        let notifier = Arc::new(Notifier::new());
        let tokens = TokenIssuer::new(&settings.token_secret, settings.token_ttl());
        let cost = HashCost {
            log_n: settings.password_hash_log_n,
        };
        let observer: Arc<dyn LoginObserver> = notifier.clone();
        let auth = Arc::new(DefaultAuth::new(store.clone(), tokens, cost, observer));

        Self {
            auth,
            store,
            notifier,
            settings: Arc::new(settings),
        }
    }

    /// Router serving the GraphQL endpoint
    pub fn api_router(&self) -> Router {
        api::create_router(ApiState {
            schema: api::build_schema(self.auth.clone(), self.store.clone()),
            auth: self.auth.clone(),
            legacy_quoted_tokens: self.settings.legacy_quoted_tokens,
        })
    }

    /// Router serving the push channel
    pub fn push_router(&self) -> Router {
        ws_router::create_router(self.notifier.clone())
    }
}
