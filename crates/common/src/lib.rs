// ================
// crates/common/src/lib.rs
// ================
//! Common types shared between the login-counter server and its clients.
//! This module defines the push-channel message and the identifiers that
//! appear on the wire.

use serde::{Deserialize, Serialize};

/// Identifier of a registered user (auto-increment primary key)
pub type UserId = i64;

/// Default port of the GraphQL endpoint
pub const DEFAULT_API_PORT: u16 = 4001;

/// Default port of the push channel
pub const DEFAULT_PUSH_PORT: u16 = 3000;

/// Message pushed to every listener after a successful login.
///
/// Serialized as `{"count": <aggregate>}` where the aggregate is the sum of
/// all users' sign-in counters at the time of the login.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginCount {
    /// Sum of every user's sign-in counter
    pub count: i64,
}

impl LoginCount {
    pub fn new(count: i64) -> Self {
        Self { count }
    }

    /// Encode as the JSON text frame sent to listeners
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
