//! HTTP API endpoints
//!
//! `/api/draw-state` is the durable mailbox transport: displays that cannot
//! hold a WebSocket poll it, and remote authorities write it.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

use crate::protocol::Envelope;
use crate::state::AppState;
use crate::types::{DrawConfig, DrawState, HistoryRecord};

/// Authority snapshot for dashboards
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    pub state: DrawState,
    pub config: DrawConfig,
    pub headers: Vec<String>,
    pub pool_size: usize,
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/draw-state", get(read_draw_state).post(write_draw_state))
        .route("/api/history", get(history))
        .route("/api/state", get(snapshot))
}

/// Latest replicated envelope.
///
/// GET /api/draw-state
///
/// An empty or unreadable mailbox answers `RESET`.
pub async fn read_draw_state(State(state): State<Arc<AppState>>) -> Json<Envelope> {
    Json(state.replicator().latest().await)
}

/// Overwrite the mailbox.
///
/// POST /api/draw-state
pub async fn write_draw_state(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Envelope>, JsonRejection>,
) -> Response {
    let Json(envelope) = match body {
        Ok(body) => body,
        Err(rejection) => {
            tracing::debug!("Rejected mailbox write: {}", rejection.body_text());
            return (
                StatusCode::BAD_REQUEST,
                format!("Invalid envelope: {}", rejection.body_text()),
            )
                .into_response();
        }
    };

    let mailbox = state.replicator().mailbox();
    match mailbox.write(&envelope).await {
        Ok(()) => {
            tracing::debug!(kind = envelope.kind(), "Mailbox written over HTTP");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => {
            tracing::warn!(mailbox = mailbox.name(), "Mailbox write failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, format!("Write failed: {}", e)).into_response()
        }
    }
}

/// Draw history, newest first.
///
/// GET /api/history
pub async fn history(State(state): State<Arc<AppState>>) -> Json<Vec<HistoryRecord>> {
    Json(state.get_history().await)
}

/// GET /api/state
pub async fn snapshot(State(state): State<Arc<AppState>>) -> Json<StateSnapshot> {
    Json(StateSnapshot {
        state: state.draw_state().await,
        config: state.get_config().await,
        headers: state.get_headers().await,
        pool_size: state.get_pool().await.len(),
    })
}
