// crates/server/src/routes/surface.rs
//! The session surface WebSocket.
//!
//! One socket per session. Inbound text frames are parsed as
//! [`ClientEvent`]s and queued for the controller; outbound frames arrive
//! through the connection registry and are serialized here. The socket
//! task owns no display state, so a slow client can at worst lag its own
//! frames.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    response::Response,
    routing::get,
    Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::controller::ControlEvent;
use crate::error::ApiError;
use crate::metrics::set_connections_active;
use crate::protocol::{ClientEvent, SessionId};
use crate::state::AppState;

/// Query parameters for GET /api/surface.
#[derive(Debug, Deserialize)]
pub struct SurfaceQuery {
    /// Client-chosen session id; omitted or blank means the server mints
    /// one.
    pub session: Option<String>,
}

/// GET /api/surface - Upgrade to the session surface WebSocket.
///
/// Rejects with 503 before the upgrade when the session limit is reached,
/// unless this is a reconnect of an already-connected session.
pub async fn surface_upgrade(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SurfaceQuery>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let session = resolve_session(query);
    if !state.connections.is_connected(&session)
        && state.connections.count() >= state.connections.limit()
    {
        return Err(ApiError::PopulationFull(state.connections.limit()));
    }
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, session, state)))
}

fn resolve_session(query: SurfaceQuery) -> SessionId {
    query
        .session
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(SessionId)
        .unwrap_or_else(SessionId::generate)
}

async fn handle_socket(socket: WebSocket, session: SessionId, state: Arc<AppState>) {
    let (mut sink, mut stream) = socket.split();
    let (frame_tx, mut frame_rx) = mpsc::unbounded_channel();

    if let Err(err) = state.connections.register(session.clone(), frame_tx.clone()) {
        // the pre-upgrade check raced another connection
        tracing::warn!(%session, %err, "connection rejected");
        let _ = sink.close().await;
        return;
    }
    set_connections_active(state.connections.count());
    tracing::info!(%session, "session connected");

    let forward = tokio::spawn(async move {
        while let Some(frame) = frame_rx.recv().await {
            let text = match serde_json::to_string(&frame) {
                Ok(text) => text,
                Err(err) => {
                    tracing::error!(%err, "failed to encode frame");
                    continue;
                }
            };
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(message)) = stream.next().await {
        match message {
            Message::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => {
                    let queued = state.control_tx.send(ControlEvent::Client {
                        session: session.clone(),
                        event,
                    });
                    if queued.is_err() {
                        break;
                    }
                }
                Err(err) => {
                    tracing::debug!(%session, %err, "malformed client event ignored");
                }
            },
            Message::Close(_) => break,
            // axum answers pings itself; binary frames are not part of the
            // protocol
            _ => {}
        }
    }

    if state.connections.remove(&session, &frame_tx) {
        set_connections_active(state.connections.count());
        let _ = state.control_tx.send(ControlEvent::Disconnected {
            session: session.clone(),
        });
        tracing::info!(%session, "session disconnected");
    } else {
        // a reconnect replaced this socket; the new one owns the session now
        tracing::debug!(%session, "stale socket closed");
    }
    forward.abort();
}

/// Create the surface routes router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/surface", get(surface_upgrade))
}
