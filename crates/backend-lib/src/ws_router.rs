// ============================
// crates/backend-lib/src/ws_router.rs
// ============================
//! Push-channel router and connection handling.
//!
//! Any path on the push port upgrades to a WebSocket. The server only
//! writes; client frames are read to detect close and otherwise ignored.
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use futures_util::{SinkExt, StreamExt};
use metrics::counter;
use tracing::{debug, warn};

use crate::metrics::PUSH_CONNECTION;
use crate::notifier::Notifier;

/// Create the push-channel router
pub fn create_router(notifier: Arc<Notifier>) -> Router {
    Router::new()
        .route("/", get(ws_handler))
        .route("/{*path}", get(ws_handler))
        .with_state(notifier)
}

/// Handler for WebSocket connections
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(notifier): State<Arc<Notifier>>,
) -> impl IntoResponse {
    counter!(PUSH_CONNECTION).increment(1);
    ws.on_upgrade(move |socket| handle_connection(socket, notifier))
}

async fn handle_connection(socket: WebSocket, notifier: Arc<Notifier>) {
    let (mut tx, mut rx) = socket.split();
    let mut subscription = notifier.subscribe();
    let id = subscription.id;

    loop {
        tokio::select! {
            update = subscription.rx.recv() => {
                let Some(update) = update else { break };
                let json = match update.to_json() {
                    Ok(json) => json,
                    Err(e) => {
                        warn!(%id, "failed to encode login count: {e}");
                        continue;
                    },
                };
                if tx.send(Message::Text(json.into())).await.is_err() {
                    debug!(%id, "push send failed, closing");
                    break;
                }
            },
            incoming = rx.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        debug!(%id, "push socket error: {e}");
                        break;
                    },
                    // no client-to-server protocol
                    Some(Ok(_)) => {},
                }
            },
        }
    }

    notifier.unsubscribe(id);
}
