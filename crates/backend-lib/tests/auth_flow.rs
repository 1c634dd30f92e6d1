// crates/backend-lib/tests/auth_flow.rs
//! Registration, login and token verification against a real SQLite store.
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use logincount_backend::auth::{
    AuthService, DefaultAuth, HashCost, LoginObserver, TokenIssuer, DEFAULT_TOKEN_TTL,
};
use logincount_backend::error::{AppError, AuthFailure};
use logincount_backend::storage::{SqliteUserStore, User, UserStore};
use logincount_common::UserId;

const SECRET: &str = "auth-flow-secret";
const CHEAP: HashCost = HashCost { log_n: 4 };

/// Observer that records every aggregate it is handed
#[derive(Default)]
struct RecordingObserver {
    seen: Mutex<Vec<i64>>,
}

impl RecordingObserver {
    fn seen(&self) -> Vec<i64> {
        self.seen.lock().unwrap().clone()
    }
}

impl LoginObserver for RecordingObserver {
    fn on_login(&self, total_sign_ins: i64) {
        self.seen.lock().unwrap().push(total_sign_ins);
    }
}

fn auth_with(store: Arc<dyn UserStore>) -> (DefaultAuth, Arc<RecordingObserver>) {
    let observer = Arc::new(RecordingObserver::default());
    let auth = DefaultAuth::new(
        store,
        TokenIssuer::new(SECRET, DEFAULT_TOKEN_TTL),
        CHEAP,
        observer.clone(),
    );
    (auth, observer)
}

fn setup() -> (DefaultAuth, Arc<SqliteUserStore>, Arc<RecordingObserver>) {
    let store = Arc::new(SqliteUserStore::open_in_memory().unwrap());
    let (auth, observer) = auth_with(store.clone());
    (auth, store, observer)
}

#[tokio::test]
async fn test_register_twice_is_rejected() {
    let (auth, store, _) = setup();

    let first = auth.register("alice", "correct").await.unwrap();
    assert_eq!(first.sign_in_count, 0);
    assert_ne!(first.password_hash, "correct");

    let err = auth.register("alice", "other").await.unwrap_err();
    assert!(matches!(err, AppError::ConstraintViolation(_)));

    let stored = store.find_by_username("alice").await.unwrap().unwrap();
    assert_eq!(stored, first);
    // the original password still works
    assert!(auth.login("alice", "correct").await.is_ok());
}

#[tokio::test]
async fn test_empty_username_is_rejected() {
    let (auth, _, _) = setup();
    let err = auth.register("   ", "pw").await.unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));
}

#[tokio::test]
async fn test_login_issues_token_and_counts() {
    let (auth, store, observer) = setup();
    let alice = auth.register("alice", "correct").await.unwrap();

    let result = auth.login("alice", "correct").await.unwrap();
    assert_eq!(result.username, "alice");
    assert_eq!(result.user_id, alice.id);
    assert_eq!(result.sign_in_count, 1);
    assert_eq!(auth.verify_token(&result.token).unwrap(), alice.id);

    let stored = store.find_by_id(alice.id).await.unwrap().unwrap();
    assert_eq!(stored.sign_in_count, 1);
    assert_eq!(observer.seen(), vec![1]);
}

#[tokio::test]
async fn test_wrong_password_changes_nothing() {
    let (auth, store, observer) = setup();
    let alice = auth.register("alice", "correct").await.unwrap();

    let err = auth.login("alice", "wrong").await.unwrap_err();
    assert!(matches!(
        err,
        AppError::AuthenticationFailed(AuthFailure::WrongPassword)
    ));

    let stored = store.find_by_id(alice.id).await.unwrap().unwrap();
    assert_eq!(stored.sign_in_count, 0);
    assert!(observer.seen().is_empty());
}

#[tokio::test]
async fn test_unknown_user_cannot_login() {
    let (auth, _, observer) = setup();
    let err = auth.login("ghost", "anything").await.unwrap_err();
    assert!(matches!(
        err,
        AppError::AuthenticationFailed(AuthFailure::UnknownUser)
    ));
    assert!(observer.seen().is_empty());
}

#[tokio::test]
async fn test_sum_matches_individual_counters() {
    let (auth, store, observer) = setup();
    let names = ["alice", "bob", "carol"];
    for name in names {
        auth.register(name, "pw").await.unwrap();
    }

    let logins = [("alice", 3), ("bob", 1), ("carol", 2)];
    for (name, times) in logins {
        for _ in 0..times {
            auth.login(name, "pw").await.unwrap();
        }
    }

    let mut individual = 0;
    for name in names {
        individual += store
            .find_by_username(name)
            .await
            .unwrap()
            .unwrap()
            .sign_in_count;
    }
    assert_eq!(individual, 6);
    assert_eq!(store.sum_of_sign_in_counts().await.unwrap(), individual);
    // the observer saw the running aggregate after every login
    assert_eq!(observer.seen(), vec![1, 2, 3, 4, 5, 6]);
}

#[tokio::test]
async fn test_expired_token_fails_verification() {
    let (auth, _, _) = setup();
    let alice = auth.register("alice", "pw").await.unwrap();

    let stale = TokenIssuer::new(SECRET, DEFAULT_TOKEN_TTL)
        .issue_at(alice.id, SystemTime::now() - Duration::from_secs(61 * 60))
        .unwrap();

    let err = auth.verify_token(&stale).unwrap_err();
    assert!(matches!(
        err,
        AppError::AuthenticationFailed(AuthFailure::InvalidToken(_))
    ));
}

/// Store whose username lookups always return the match twice
struct DuplicatingStore {
    inner: SqliteUserStore,
}

#[async_trait]
impl UserStore for DuplicatingStore {
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, AppError> {
        self.inner.create_user(username, password_hash).await
    }

    async fn users_by_username(&self, username: &str) -> Result<Vec<User>, AppError> {
        let mut users = self.inner.users_by_username(username).await?;
        users.extend(users.clone());
        Ok(users)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, AppError> {
        self.inner.find_by_id(id).await
    }

    async fn increment_sign_in_count(&self, id: UserId) -> Result<User, AppError> {
        self.inner.increment_sign_in_count(id).await
    }

    async fn sum_of_sign_in_counts(&self) -> Result<i64, AppError> {
        self.inner.sum_of_sign_in_counts().await
    }
}

#[tokio::test]
async fn test_ambiguous_username_is_rejected() {
    let store = Arc::new(DuplicatingStore {
        inner: SqliteUserStore::open_in_memory().unwrap(),
    });
    let (auth, observer) = auth_with(store.clone());
    auth.register("twin", "pw").await.unwrap();

    let err = auth.login("twin", "pw").await.unwrap_err();
    assert!(matches!(
        err,
        AppError::AuthenticationFailed(AuthFailure::AmbiguousUser)
    ));
    assert_eq!(store.sum_of_sign_in_counts().await.unwrap(), 0);
    assert!(observer.seen().is_empty());
}
