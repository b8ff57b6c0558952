//! `WS /sim/{ns}/ws/live` (spec §6): a read-only fan-out of the
//! namespace's tick/scoring events. One `broadcast::Receiver` per
//! connected socket; a lagging or dropped client is simply closed,
//! matching the engine's fire-and-forget policy.

use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use tracing::debug;

use crate::state::AppState;
use crate::util::parse_namespace;

pub async fn ws_live(
    State(state): State<AppState>,
    Path(ns): Path<String>,
    ws: WebSocketUpgrade,
) -> Response {
    let namespace = match parse_namespace(&ns) {
        Ok(namespace) => namespace,
        Err(e) => return e.into_response(),
    };
    let handle = match state.registry.handle_for(&namespace) {
        Ok(handle) => handle,
        Err(e) => return e.into_response(),
    };

    ws.on_upgrade(move |socket| stream_events(socket, handle))
}

async fn stream_events(mut socket: WebSocket, handle: monument_engine::NamespaceHandle) {
    let mut events = handle.subscribe();
    loop {
        tokio::select! {
            event = events.recv() => {
                let event = match event {
                    Ok(event) => event,
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                };
                let payload = match serde_json::to_string(&event) {
                    Ok(payload) => payload,
                    Err(_) => continue,
                };
                if socket.send(WsMessage::Text(payload)).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(WsMessage::Close(_))) | None => break,
                    Some(Ok(_)) => {
                        debug!("ignoring inbound message on a read-only live feed");
                    }
                    Some(Err(_)) => break,
                }
            }
        }
    }
}
