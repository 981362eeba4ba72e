use super::AppState;
use crate::types::*;

impl AppState {
    /// Prepend a record for a finished roll
    pub(super) async fn record_history(&self, winners: Vec<Participant>) {
        let record = HistoryRecord {
            timestamp: chrono::Utc::now().to_rfc3339(),
            winners,
        };
        self.history.write().await.insert(0, record);
    }

    /// All past rolls, newest first
    pub async fn get_history(&self) -> Vec<HistoryRecord> {
        self.history.read().await.clone()
    }
}
