mod draw;
mod history;
mod pool;
pub mod session;

use crate::broadcast::Replicator;
use crate::import::ImportError;
use crate::mailbox::{Mailbox, MemoryMailbox};
use crate::types::*;
use session::DrawSession;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

/// Default cap on participants carried by a replicated START_ROLL
pub const DEFAULT_MAX_REPLICATED_POOL: usize = 2000;

/// Errors surfaced to the operator by state operations
#[derive(Debug, thiserror::Error)]
pub enum DrawError {
    #[error("A draw is already rolling")]
    RollInProgress,

    #[error("No draw is rolling")]
    NotRolling,

    #[error("Participant not found: {0}")]
    ParticipantNotFound(ParticipantId),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Import failed: {0}")]
    Import(#[from] ImportError),
}

impl DrawError {
    /// Stable code used on the wire
    pub fn code(&self) -> &'static str {
        match self {
            DrawError::RollInProgress => "ROLL_IN_PROGRESS",
            DrawError::NotRolling => "NOT_ROLLING",
            DrawError::ParticipantNotFound(_) => "PARTICIPANT_NOT_FOUND",
            DrawError::InvalidConfig(_) => "INVALID_CONFIG",
            DrawError::Import(_) => "IMPORT_FAILED",
        }
    }
}

/// Authority state: the operator side of the draw
#[derive(Clone)]
pub struct AppState {
    session: Arc<RwLock<DrawSession>>,
    pool: Arc<RwLock<Vec<Participant>>>,
    headers: Arc<RwLock<Vec<String>>>,
    config: Arc<RwLock<DrawConfig>>,
    /// Newest first, operator-local, never replicated
    history: Arc<RwLock<Vec<HistoryRecord>>>,
    /// Pending automatic Stop of the current roll
    auto_stop: Arc<Mutex<Option<JoinHandle<()>>>>,
    replicator: Replicator,
    max_replicated_pool: usize,
}

impl AppState {
    /// In-memory authority. Must be called from within a tokio runtime.
    pub fn new() -> Self {
        Self::with_mailbox(Arc::new(MemoryMailbox::new()), DEFAULT_MAX_REPLICATED_POOL)
    }

    pub fn with_mailbox(mailbox: Arc<dyn Mailbox>, max_replicated_pool: usize) -> Self {
        Self {
            session: Arc::new(RwLock::new(DrawSession::new())),
            pool: Arc::new(RwLock::new(Vec::new())),
            headers: Arc::new(RwLock::new(Vec::new())),
            config: Arc::new(RwLock::new(DrawConfig::default())),
            history: Arc::new(RwLock::new(Vec::new())),
            auto_stop: Arc::new(Mutex::new(None)),
            replicator: Replicator::new(mailbox),
            max_replicated_pool: max_replicated_pool.max(1),
        }
    }

    pub fn replicator(&self) -> &Replicator {
        &self.replicator
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::mock_pool;

    #[tokio::test]
    async fn test_new_state_is_idle() {
        let state = AppState::new();
        let draw = state.draw_state().await;

        assert_eq!(draw.phase, DrawPhase::Idle);
        assert!(draw.winners.is_empty());
        assert_eq!(draw.sequence, 0);
        assert!(state.get_pool().await.is_empty());
        assert!(state.get_history().await.is_empty());
    }

    #[tokio::test]
    async fn test_mock_pool_loaded() {
        let state = AppState::new();
        state.import_pool(mock_pool()).await.unwrap();

        assert_eq!(state.get_pool().await.len(), 200);
        assert_eq!(state.get_headers().await.len(), 3);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(DrawError::RollInProgress.code(), "ROLL_IN_PROGRESS");
        assert_eq!(DrawError::NotRolling.code(), "NOT_ROLLING");
        assert_eq!(
            DrawError::Import(ImportError::Empty).code(),
            "IMPORT_FAILED"
        );
    }
}
