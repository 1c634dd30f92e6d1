//! Test utilities shared by the integration tests
//!
//! Builds an `AppState` on a throw-away SQLite file with a cheap password
//! hash cost so tests stay fast.

#![allow(dead_code)]

use logincount_backend::{config::Settings, AppState};
use tempfile::TempDir;

/// Secret every test state signs tokens with
pub const TEST_SECRET: &str = "integration-test-secret";

/// Settings suitable for tests (cheap scrypt, fixed secret)
pub fn test_settings() -> Settings {
    Settings {
        token_secret: TEST_SECRET.to_string(),
        password_hash_log_n: 4,
        ..Settings::default()
    }
}

/// Sets up a test environment backed by a database in a temporary directory
///
/// Keep the returned `TempDir` in scope for the duration of the test.
pub fn setup_test_env() -> (AppState, TempDir) {
    setup_test_env_with(test_settings())
}

/// Same as [`setup_test_env`] with caller-provided settings
pub fn setup_test_env_with(mut settings: Settings) -> (AppState, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    settings.database_path = temp_dir.path().join("users.sqlite");
    let state = AppState::new(settings).expect("Failed to create AppState for test");
    (state, temp_dir)
}
