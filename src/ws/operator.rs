//! Operator console command handlers
//!
//! Authorization is checked in the dispatch layer before calling these.

use crate::protocol::ServerMessage;
use crate::state::{AppState, DrawError};
use crate::types::{DrawConfig, Fields, ParticipantId};
use std::sync::Arc;

fn error(e: DrawError) -> Option<ServerMessage> {
    tracing::debug!(code = e.code(), "Operator command refused: {}", e);
    Some(ServerMessage::Error {
        code: e.code().to_string(),
        msg: e.to_string(),
    })
}

async fn draw_state(state: &Arc<AppState>) -> Option<ServerMessage> {
    Some(ServerMessage::DrawState {
        state: state.draw_state().await,
    })
}

async fn pool(state: &Arc<AppState>) -> Option<ServerMessage> {
    Some(ServerMessage::Pool {
        headers: state.get_headers().await,
        participants: state.get_pool().await,
    })
}

pub async fn handle_start_draw(state: &Arc<AppState>) -> Option<ServerMessage> {
    match state.start_draw().await {
        Ok(snapshot) => Some(ServerMessage::DrawState { state: snapshot }),
        Err(e) => error(e),
    }
}

pub async fn handle_stop_draw(state: &Arc<AppState>) -> Option<ServerMessage> {
    match state.stop_draw().await {
        Ok(_) => draw_state(state).await,
        Err(e) => error(e),
    }
}

pub async fn handle_toggle_draw(state: &Arc<AppState>) -> Option<ServerMessage> {
    match state.toggle_draw().await {
        Ok(snapshot) => Some(ServerMessage::DrawState { state: snapshot }),
        Err(e) => error(e),
    }
}

pub async fn handle_reset_draw(state: &Arc<AppState>) -> Option<ServerMessage> {
    Some(ServerMessage::DrawState {
        state: state.reset_draw().await,
    })
}

pub async fn handle_recolor(state: &Arc<AppState>, color: String) -> Option<ServerMessage> {
    match state.recolor(color).await {
        Ok(snapshot) => Some(ServerMessage::DrawState { state: snapshot }),
        Err(e) => error(e),
    }
}

pub async fn handle_update_config(
    state: &Arc<AppState>,
    config: DrawConfig,
) -> Option<ServerMessage> {
    match state.update_config(config).await {
        Ok(config) => Some(ServerMessage::Config { config }),
        Err(e) => error(e),
    }
}

pub async fn handle_import_json(state: &Arc<AppState>, content: String) -> Option<ServerMessage> {
    tracing::info!("Operator importing {} bytes of JSON", content.len());
    match state.import_json(&content).await {
        Ok(imported) => Some(ServerMessage::Imported {
            count: imported.participants.len(),
            headers: imported.headers,
        }),
        Err(e) => error(e),
    }
}

pub async fn handle_import_csv(state: &Arc<AppState>, content: String) -> Option<ServerMessage> {
    tracing::info!("Operator importing {} bytes of CSV", content.len());
    match state.import_csv(&content).await {
        Ok(imported) => Some(ServerMessage::Imported {
            count: imported.participants.len(),
            headers: imported.headers,
        }),
        Err(e) => error(e),
    }
}

pub async fn handle_load_mock_pool(state: &Arc<AppState>) -> Option<ServerMessage> {
    match state.load_mock_pool().await {
        Ok(count) => Some(ServerMessage::Imported {
            count,
            headers: state.get_headers().await,
        }),
        Err(e) => error(e),
    }
}

pub async fn handle_set_preselected(
    state: &Arc<AppState>,
    participant_id: ParticipantId,
    preselected: bool,
) -> Option<ServerMessage> {
    match state.set_preselected(&participant_id, preselected).await {
        Ok(()) => pool(state).await,
        Err(e) => error(e),
    }
}

pub async fn handle_edit_participant(
    state: &Arc<AppState>,
    participant_id: ParticipantId,
    fields: Fields,
) -> Option<ServerMessage> {
    match state.update_participant(&participant_id, fields).await {
        Ok(()) => pool(state).await,
        Err(e) => error(e),
    }
}

pub async fn handle_remove_participant(
    state: &Arc<AppState>,
    participant_id: ParticipantId,
) -> Option<ServerMessage> {
    tracing::info!("Operator removing participant {}", participant_id);
    match state.remove_participant(&participant_id).await {
        Ok(()) => pool(state).await,
        Err(e) => error(e),
    }
}

pub async fn handle_clear_pool(state: &Arc<AppState>) -> Option<ServerMessage> {
    match state.clear_pool().await {
        Ok(()) => pool(state).await,
        Err(e) => error(e),
    }
}

pub async fn handle_search_pool(state: &Arc<AppState>, term: String) -> Option<ServerMessage> {
    let participants = state.search_pool(&term).await;
    Some(ServerMessage::SearchResults { term, participants })
}

pub async fn handle_get_pool(state: &Arc<AppState>) -> Option<ServerMessage> {
    pool(state).await
}

pub async fn handle_get_history(state: &Arc<AppState>) -> Option<ServerMessage> {
    Some(ServerMessage::History {
        records: state.get_history().await,
    })
}

pub async fn handle_request_snapshot(state: &Arc<AppState>) -> Option<ServerMessage> {
    draw_state(state).await
}
