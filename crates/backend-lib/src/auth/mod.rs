// ============================
// crates/backend-lib/src/auth/mod.rs
// ============================
//! Authentication module.

pub mod observer;
pub mod password;
pub mod token;
mod service;
mod service_impl;

pub use observer::LoginObserver;
pub use password::{hash_password, verify_password, HashCost, DEFAULT_LOG_N};
pub use service::{AuthService, LoginResult};
pub use service_impl::DefaultAuth;
pub use token::{TokenIssuer, DEFAULT_TOKEN_TTL};
