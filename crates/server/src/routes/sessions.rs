// crates/server/src/routes/sessions.rs
//! Session listing endpoint.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use tokio::sync::oneshot;

use crate::controller::{ControlEvent, SessionSummary};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// GET /api/sessions - Sessions currently holding display state.
///
/// The listing comes from the controller task itself, so it reflects
/// every event queued before this request.
pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<SessionSummary>>> {
    let (reply, rx) = oneshot::channel();
    state
        .control_tx
        .send(ControlEvent::Sessions { reply })
        .map_err(|_| ApiError::ControllerUnavailable)?;
    let listing = rx.await.map_err(|_| ApiError::ControllerUnavailable)?;
    Ok(Json(listing))
}

/// Create the sessions routes router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/sessions", get(list_sessions))
}
