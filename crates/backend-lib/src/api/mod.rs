// ============================
// crates/backend-lib/src/api/mod.rs
// ============================
//! GraphQL API layer.
//!
//! `POST /` executes a query, `GET /` serves GraphiQL. The caller identity is
//! resolved from the `authorization` header before the query runs and handed
//! to resolvers as request data.

pub mod caller;
pub mod schema;

pub use caller::{extract_token, Caller};
pub use schema::{build_schema, AppSchema, LogInPayload, QueryRoot, UserObject};

use std::sync::Arc;

use async_graphql::{http::GraphiQLSource, Value};
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use tracing::debug;

use crate::auth::AuthService;

/// State shared by the API handlers
#[derive(Clone)]
pub struct ApiState {
    pub schema: AppSchema,
    pub auth: Arc<dyn AuthService>,
    pub legacy_quoted_tokens: bool,
}

/// Create the GraphQL router
pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(graphiql).post(graphql_handler))
        .with_state(state)
}

async fn graphql_handler(
    State(state): State<ApiState>,
    headers: HeaderMap,
    req: GraphQLRequest,
) -> Response {
    let caller = Caller::from_headers(&headers, state.auth.as_ref(), state.legacy_quoted_tokens);
    debug!(?caller, "graphql request");

    let response = state.schema.execute(req.into_inner().data(caller)).await;
    let status = response_status(&response);
    (status, GraphQLResponse::from(response)).into_response()
}

async fn graphiql() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint("/").finish())
}

/// HTTP status for a response: the `status` extension of its first error, else 200
fn response_status(response: &async_graphql::Response) -> StatusCode {
    response
        .errors
        .first()
        .and_then(|err| err.extensions.as_ref())
        .and_then(|ext| ext.get("status"))
        .and_then(|status| match status {
            Value::Number(n) => n.as_u64(),
            _ => None,
        })
        .and_then(|status| u16::try_from(status).ok())
        .and_then(|status| StatusCode::from_u16(status).ok())
        .unwrap_or(StatusCode::OK)
}
