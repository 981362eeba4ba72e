use crate::types::*;
use serde::{Deserialize, Serialize};

/// Replicated draw transition, identical on every transport.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum Envelope {
    StartRoll {
        count: u32,
        grid_columns: u32,
        duration: u32,
        background_color: String,
        remove_winners: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pool: Option<Vec<Participant>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        headers: Option<Vec<String>>,
        #[serde(default)]
        sequence: Sequence,
    },
    StopRoll {
        winners: Vec<Participant>,
    },
    #[default]
    Reset,
    UpdateBackground {
        color: String,
    },
}

impl Envelope {
    /// Wire name of the envelope, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Envelope::StartRoll { .. } => "START_ROLL",
            Envelope::StopRoll { .. } => "STOP_ROLL",
            Envelope::Reset => "RESET",
            Envelope::UpdateBackground { .. } => "UPDATE_BACKGROUND",
        }
    }

    /// Ordering token, only carried by START_ROLL
    pub fn sequence(&self) -> Option<Sequence> {
        match self {
            Envelope::StartRoll { sequence, .. } => Some(*sequence),
            _ => None,
        }
    }
}

/// Commands sent by the operator console
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ClientMessage {
    HostStartDraw,
    HostStopDraw,
    /// Spacebar: start when idle or revealed, stop when rolling
    HostToggleDraw,
    HostResetDraw,
    HostRecolor {
        color: String,
    },
    HostUpdateConfig {
        config: DrawConfig,
    },
    /// Replace the pool with a JSON array of objects
    HostImportJson {
        content: String,
    },
    /// Replace the pool with CSV text that has a header row
    HostImportCsv {
        content: String,
    },
    HostLoadMockPool,
    HostSetPreselected {
        participant_id: ParticipantId,
        preselected: bool,
    },
    HostEditParticipant {
        participant_id: ParticipantId,
        fields: Fields,
    },
    HostRemoveParticipant {
        participant_id: ParticipantId,
    },
    HostClearPool,
    HostSearchPool {
        term: String,
    },
    HostGetPool,
    HostGetHistory,
    RequestSnapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        protocol: String,
        role: Role,
        state: DrawState,
        config: DrawConfig,
        server_now: String,
    },
    DrawState {
        state: DrawState,
    },
    Pool {
        headers: Vec<String>,
        participants: Vec<Participant>,
    },
    SearchResults {
        term: String,
        participants: Vec<Participant>,
    },
    History {
        records: Vec<HistoryRecord>,
    },
    Config {
        config: DrawConfig,
    },
    Imported {
        count: usize,
        headers: Vec<String>,
    },
    Error {
        code: String,
        msg: String,
    },
}
