//! WebSocket upgrade handler.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::{info, warn};

use kinnect_core::error::ErrorKind;
use kinnect_core::types::UserId;
use kinnect_realtime::event::{ClientEvent, ServerEvent};

use crate::dto::request::WsQuery;
use crate::error::ApiError;
use crate::state::AppState;

/// GET /ws?token={jwt}
///
/// Authenticates before the upgrade; the verified identity is pinned to
/// the connection and a `join` for any other user is rejected.
pub async fn ws_upgrade(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
) -> Result<Response, ApiError> {
    let claims = state.jwt_decoder.decode(&query.token)?;
    let user_id = claims.user_id();

    Ok(ws.on_upgrade(move |socket| handle_socket(state, user_id, socket)))
}

async fn handle_socket(state: AppState, authed: UserId, socket: WebSocket) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (handle, mut outbound_rx) = state.engine.gateway.open();

    info!(session_id = %handle.id, user_id = %authed, "WebSocket connection established");

    // Forward outbound events to the socket as JSON text frames.
    let outbound_task = tokio::spawn(async move {
        while let Some(event) = outbound_rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, "Failed to serialize outbound event");
                    continue;
                }
            };
            if ws_tx.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(result) = ws_rx.next().await {
        match result {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(ClientEvent::Join { user_id }) if user_id != authed => {
                    handle.send(ServerEvent::Error {
                        code: ErrorKind::Authentication.to_string(),
                        message: "Join does not match the authenticated identity".to_string(),
                    });
                }
                Ok(event) => state.engine.gateway.handle_event(&handle, event).await,
                Err(e) => {
                    handle.send(ServerEvent::Error {
                        code: "INVALID_MESSAGE".to_string(),
                        message: format!("Failed to parse event: {e}"),
                    });
                }
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(session_id = %handle.id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    outbound_task.abort();
    state.engine.gateway.close(&handle).await;

    info!(session_id = %handle.id, user_id = %authed, "WebSocket connection closed");
}
