// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for metric keys
pub const USER_CREATED: &str = "user.created";
pub const LOGIN_SUCCEEDED: &str = "login.succeeded";
pub const LOGIN_FAILED: &str = "login.failed";
pub const PUSH_CONNECTION: &str = "push.connection";
pub const PUSH_ACTIVE: &str = "push.active";
pub const PUSH_DELIVERED: &str = "push.delivered";
pub const PUSH_DROPPED: &str = "push.dropped";
