// ============================
// crates/backend-lib/src/auth/observer.rs
// ============================
//! Hook invoked after every successful login.

/// Receives the aggregate login count after each successful login.
///
/// Implementations must not block and must not fail: the login has already
/// been committed when this runs.
pub trait LoginObserver: Send + Sync {
    fn on_login(&self, total_sign_ins: i64);
}
