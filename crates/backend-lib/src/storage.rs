// ============================
// crates/backend-lib/src/storage.rs
// ============================
//! Credential store abstraction with a SQLite implementation.
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use logincount_common::UserId;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::AppError;

/// A registered account as persisted in the `users` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
    pub sign_in_count: i64,
}

impl User {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            username: row.get(1)?,
            password_hash: row.get(2)?,
            // legacy rows may hold NULL
            sign_in_count: row.get::<_, Option<i64>>(3)?.unwrap_or(0),
        })
    }
}

/// Trait for credential store backends
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user with a zero sign-in counter
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, AppError>;

    /// Every user whose username matches exactly
    async fn users_by_username(&self, username: &str) -> Result<Vec<User>, AppError>;

    /// Look up a user by username
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self.users_by_username(username).await?.into_iter().next())
    }

    /// Look up a user by id
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, AppError>;

    /// Add one to the user's sign-in counter and return the updated record
    async fn increment_sign_in_count(&self, id: UserId) -> Result<User, AppError>;

    /// Sum of every user's sign-in counter, 0 when there are no users
    async fn sum_of_sign_in_counts(&self) -> Result<i64, AppError>;
}

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username VARCHAR(255) NOT NULL UNIQUE,
    password VARCHAR(255) NOT NULL,
    signInCount INTEGER
);";

const USER_COLUMNS: &str = "id, username, password, signInCount";

/// SQLite implementation of the `UserStore` trait
#[derive(Clone)]
pub struct SqliteUserStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteUserStore {
    /// Open (or create) the database file at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, AppError> {
        let conn = Connection::open(path.as_ref())?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        Self::init(conn)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self, AppError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, AppError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a closure against the connection on the blocking pool
    async fn with_conn<T, F>(&self, f: F) -> Result<T, AppError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, AppError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock();
            f(&conn)
        })
        .await?
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, AppError> {
        let username = username.to_string();
        let password_hash = password_hash.to_string();
        self.with_conn(move |conn| {
            let inserted = conn.query_row(
                &format!(
                    "INSERT INTO users (username, password, signInCount) VALUES (?1, ?2, 0)
                     RETURNING {USER_COLUMNS}"
                ),
                params![username, password_hash],
                User::from_row,
            );
            match inserted {
                Ok(user) => Ok(user),
                Err(rusqlite::Error::SqliteFailure(err, _))
                    if err.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    Err(AppError::ConstraintViolation(username))
                },
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    async fn users_by_username(&self, username: &str) -> Result<Vec<User>, AppError> {
        let username = username.to_string();
        self.with_conn(move |conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"))?;
            let users = stmt
                .query_map(params![username], User::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(users)
        })
        .await
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, AppError> {
        self.with_conn(move |conn| {
            let user = conn
                .query_row(
                    &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                    params![id],
                    User::from_row,
                )
                .optional()?;
            Ok(user)
        })
        .await
    }

    async fn increment_sign_in_count(&self, id: UserId) -> Result<User, AppError> {
        self.with_conn(move |conn| {
            conn.query_row(
                &format!(
                    "UPDATE users SET signInCount = COALESCE(signInCount, 0) + 1 WHERE id = ?1
                     RETURNING {USER_COLUMNS}"
                ),
                params![id],
                User::from_row,
            )
            .optional()?
            .ok_or_else(|| AppError::NotFound(format!("user {id}")))
        })
        .await
    }

    async fn sum_of_sign_in_counts(&self) -> Result<i64, AppError> {
        self.with_conn(|conn| {
            let sum = conn.query_row(
                "SELECT COALESCE(SUM(signInCount), 0) FROM users",
                [],
                |row| row.get::<_, i64>(0),
            )?;
            Ok(sum)
        })
        .await
    }
}
