// ============================
// crates/backend-lib/src/api/schema.rs
// ============================
//! GraphQL schema: `user`, `logIn`, `createUser` and `sumOfLogIns`.
use std::sync::Arc;

use async_graphql::{
    Context, EmptyMutation, EmptySubscription, ErrorExtensions, Object, Result, Schema,
    SimpleObject, ID,
};
use logincount_common::UserId;

use crate::api::Caller;
use crate::auth::{AuthService, LoginResult};
use crate::error::AppError;
use crate::storage::{User, UserStore};

pub type AppSchema = Schema<QueryRoot, EmptyMutation, EmptySubscription>;

/// Public view of a user; the password hash never leaves the server
#[derive(SimpleObject, Debug, Clone)]
#[graphql(name = "User")]
pub struct UserObject {
    pub id: ID,
    pub username: String,
    pub sign_in_count: i64,
}

impl From<User> for UserObject {
    fn from(user: User) -> Self {
        Self {
            id: ID(user.id.to_string()),
            username: user.username,
            sign_in_count: user.sign_in_count,
        }
    }
}

#[derive(SimpleObject, Debug, Clone)]
#[graphql(name = "LogInResult")]
pub struct LogInPayload {
    pub user_id: ID,
    pub username: String,
    pub token: String,
    pub sign_in_count: i64,
}

impl From<LoginResult> for LogInPayload {
    fn from(result: LoginResult) -> Self {
        Self {
            user_id: ID(result.user_id.to_string()),
            username: result.username,
            token: result.token,
            sign_in_count: result.sign_in_count,
        }
    }
}

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Fetch a user by id
    async fn user(&self, ctx: &Context<'_>, id: ID) -> Result<UserObject> {
        let id: UserId = id
            .parse()
            .map_err(|_| AppError::InvalidInput(format!("'{}' is not a user id", id.as_str())).extend())?;
        let store = ctx.data::<Arc<dyn UserStore>>()?;
        store
            .find_by_id(id)
            .await
            .map_err(|e| e.extend())?
            .map(UserObject::from)
            .ok_or_else(|| AppError::NotFound(format!("user {id}")).extend())
    }

    /// Check credentials and return a session token
    async fn log_in(
        &self,
        ctx: &Context<'_>,
        username: String,
        password: String,
    ) -> Result<LogInPayload> {
        let auth = ctx.data::<Arc<dyn AuthService>>()?;
        let result = auth.login(&username, &password).await.map_err(|e| e.extend())?;
        Ok(result.into())
    }

    /// Register a new user
    async fn create_user(
        &self,
        ctx: &Context<'_>,
        username: String,
        password: String,
    ) -> Result<UserObject> {
        let auth = ctx.data::<Arc<dyn AuthService>>()?;
        let user = auth.register(&username, &password).await.map_err(|e| e.extend())?;
        Ok(user.into())
    }

    /// Total number of logins across all users; requires a valid token
    async fn sum_of_log_ins(&self, ctx: &Context<'_>) -> Result<i64> {
        let caller = ctx.data_opt::<Caller>().unwrap_or(&Caller::Anonymous);
        caller.require_user().map_err(|e| e.extend())?;

        let store = ctx.data::<Arc<dyn UserStore>>()?;
        store.sum_of_sign_in_counts().await.map_err(|e| e.extend())
    }
}

/// Build the schema with the services resolvers read from context
pub fn build_schema(auth: Arc<dyn AuthService>, store: Arc<dyn UserStore>) -> AppSchema {
    Schema::build(QueryRoot, EmptyMutation, EmptySubscription)
        .data(auth)
        .data(store)
        .finish()
}
