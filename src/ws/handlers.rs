//! WebSocket message dispatch
//!
//! Authorization is checked here, then dispatched to the operator handlers.

use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;
use crate::types::Role;
use std::sync::Arc;

use super::operator;

/// Macro to check operator authorization and return early if unauthorized
macro_rules! check_operator {
    ($role:expr, $action:expr) => {
        if *$role != Role::Operator {
            return Some(ServerMessage::Error {
                code: "UNAUTHORIZED".to_string(),
                msg: format!("Only the operator can {}", $action),
            });
        }
    };
}

/// Handle client messages and return optional response
pub async fn handle_message(
    msg: ClientMessage,
    role: &Role,
    state: &Arc<AppState>,
) -> Option<ServerMessage> {
    match msg {
        ClientMessage::RequestSnapshot => operator::handle_request_snapshot(state).await,

        // Draw control
        ClientMessage::HostStartDraw => {
            check_operator!(role, "start draws");
            operator::handle_start_draw(state).await
        }

        ClientMessage::HostStopDraw => {
            check_operator!(role, "stop draws");
            operator::handle_stop_draw(state).await
        }

        ClientMessage::HostToggleDraw => {
            check_operator!(role, "toggle draws");
            operator::handle_toggle_draw(state).await
        }

        ClientMessage::HostResetDraw => {
            check_operator!(role, "reset draws");
            operator::handle_reset_draw(state).await
        }

        ClientMessage::HostRecolor { color } => {
            check_operator!(role, "change the background");
            operator::handle_recolor(state, color).await
        }

        ClientMessage::HostUpdateConfig { config } => {
            check_operator!(role, "configure draws");
            operator::handle_update_config(state, config).await
        }

        // Pool management
        ClientMessage::HostImportJson { content } => {
            check_operator!(role, "import participants");
            operator::handle_import_json(state, content).await
        }

        ClientMessage::HostImportCsv { content } => {
            check_operator!(role, "import participants");
            operator::handle_import_csv(state, content).await
        }

        ClientMessage::HostLoadMockPool => {
            check_operator!(role, "load the demo pool");
            operator::handle_load_mock_pool(state).await
        }

        ClientMessage::HostSetPreselected {
            participant_id,
            preselected,
        } => {
            check_operator!(role, "preselect participants");
            operator::handle_set_preselected(state, participant_id, preselected).await
        }

        ClientMessage::HostEditParticipant {
            participant_id,
            fields,
        } => {
            check_operator!(role, "edit participants");
            operator::handle_edit_participant(state, participant_id, fields).await
        }

        ClientMessage::HostRemoveParticipant { participant_id } => {
            check_operator!(role, "remove participants");
            operator::handle_remove_participant(state, participant_id).await
        }

        ClientMessage::HostClearPool => {
            check_operator!(role, "clear the pool");
            operator::handle_clear_pool(state).await
        }

        ClientMessage::HostSearchPool { term } => {
            check_operator!(role, "search the pool");
            operator::handle_search_pool(state, term).await
        }

        ClientMessage::HostGetPool => {
            check_operator!(role, "view the pool");
            operator::handle_get_pool(state).await
        }

        ClientMessage::HostGetHistory => {
            check_operator!(role, "view the history");
            operator::handle_get_history(state).await
        }
    }
}
