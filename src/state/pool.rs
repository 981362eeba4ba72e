//! Participant management between rolls
//!
//! Every mutation here is refused while a roll is spinning so the frozen
//! snapshot and the authoritative pool cannot drift apart mid-draw.

use super::{AppState, DrawError};
use crate::import::{self, ImportedPool};
use crate::types::*;

impl AppState {
    pub async fn get_pool(&self) -> Vec<Participant> {
        self.pool.read().await.clone()
    }

    pub async fn get_headers(&self) -> Vec<String> {
        self.headers.read().await.clone()
    }

    /// Case-insensitive substring search over every field value
    pub async fn search_pool(&self, term: &str) -> Vec<Participant> {
        let needle = term.trim().to_lowercase();
        self.pool
            .read()
            .await
            .iter()
            .filter(|p| {
                needle.is_empty()
                    || p.fields
                        .values()
                        .any(|v| v.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect()
    }

    /// Replace pool and headers wholesale
    pub async fn import_pool(&self, imported: ImportedPool) -> Result<usize, DrawError> {
        let session = self.session.read().await;
        if session.is_rolling() {
            return Err(DrawError::RollInProgress);
        }

        let count = imported.participants.len();
        *self.pool.write().await = imported.participants;
        *self.headers.write().await = imported.headers;
        drop(session);

        tracing::info!("Loaded {} participants", count);
        Ok(count)
    }

    /// Parse and load a JSON participant list. The pool is untouched on error.
    pub async fn import_json(&self, content: &str) -> Result<ImportedPool, DrawError> {
        let imported = import::parse_json(content)?;
        self.import_pool(imported.clone()).await?;
        Ok(imported)
    }

    /// Parse and load a CSV participant list. The pool is untouched on error.
    pub async fn import_csv(&self, content: &str) -> Result<ImportedPool, DrawError> {
        let imported = import::parse_csv(content)?;
        self.import_pool(imported.clone()).await?;
        Ok(imported)
    }

    pub async fn load_mock_pool(&self) -> Result<usize, DrawError> {
        self.import_pool(import::mock_pool()).await
    }

    pub async fn set_preselected(&self, id: &str, preselected: bool) -> Result<(), DrawError> {
        self.with_participant(id, |p| p.is_preselected = preselected)
            .await
    }

    /// Replace a participant's fields, keeping only known headers
    pub async fn update_participant(
        &self,
        id: &str,
        fields: Fields,
    ) -> Result<(), DrawError> {
        let headers = self.get_headers().await;
        let fields: Fields = headers
            .iter()
            .filter_map(|h| fields.get(h).map(|v| (h.clone(), v.clone())))
            .collect();

        self.with_participant(id, move |p| p.fields = fields).await
    }

    pub async fn remove_participant(&self, id: &str) -> Result<(), DrawError> {
        let session = self.session.read().await;
        if session.is_rolling() {
            return Err(DrawError::RollInProgress);
        }

        let mut pool = self.pool.write().await;
        let pos = pool
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| DrawError::ParticipantNotFound(id.to_string()))?;
        pool.remove(pos);
        Ok(())
    }

    pub async fn clear_pool(&self) -> Result<(), DrawError> {
        let session = self.session.read().await;
        if session.is_rolling() {
            return Err(DrawError::RollInProgress);
        }

        self.pool.write().await.clear();
        tracing::info!("Participant pool cleared");
        Ok(())
    }

    async fn with_participant<F>(&self, id: &str, apply: F) -> Result<(), DrawError>
    where
        F: FnOnce(&mut Participant),
    {
        let session = self.session.read().await;
        if session.is_rolling() {
            return Err(DrawError::RollInProgress);
        }

        let mut pool = self.pool.write().await;
        let participant = pool
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| DrawError::ParticipantNotFound(id.to_string()))?;
        apply(participant);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn state() -> AppState {
        let state = AppState::new();
        state.load_mock_pool().await.unwrap();
        state
    }

    #[tokio::test]
    async fn test_set_preselected() {
        let state = state().await;
        state.set_preselected("mock-3", true).await.unwrap();

        let pool = state.get_pool().await;
        assert!(pool.iter().find(|p| p.id == "mock-3").unwrap().is_preselected);
        assert_eq!(pool.iter().filter(|p| p.is_preselected).count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_participant() {
        let state = state().await;
        let result = state.set_preselected("nobody", true).await;
        assert!(matches!(result, Err(DrawError::ParticipantNotFound(_))));
    }

    #[tokio::test]
    async fn test_update_participant_restricts_to_headers() {
        let state = state().await;
        let fields = Fields::from([
            ("Name".to_string(), "Renamed".to_string()),
            ("Shoe Size".to_string(), "44".to_string()),
        ]);
        state.update_participant("mock-1", fields).await.unwrap();

        let pool = state.get_pool().await;
        let p = pool.iter().find(|p| p.id == "mock-1").unwrap();
        assert_eq!(p.fields["Name"], "Renamed");
        assert!(!p.fields.contains_key("Shoe Size"));
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let state = state().await;
        state.remove_participant("mock-1").await.unwrap();
        assert_eq!(state.get_pool().await.len(), 199);

        state.clear_pool().await.unwrap();
        assert!(state.get_pool().await.is_empty());
        // Headers survive so a later edit still knows the columns
        assert_eq!(state.get_headers().await.len(), 3);
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let state = state().await;
        let hits = state.search_pool("participant 10").await;
        // 10, 100..=109
        assert_eq!(hits.len(), 11);

        let hits = state.search_pool("jet commerce").await;
        assert_eq!(hits.len(), 100);

        assert_eq!(state.search_pool("").await.len(), 200);
    }

    #[tokio::test]
    async fn test_import_csv_replaces_pool() {
        let state = state().await;
        let imported = state
            .import_csv("Badge,Name\nB1,Ada\nB2,Grace\n")
            .await
            .unwrap();

        assert_eq!(imported.participants.len(), 2);
        assert_eq!(state.get_headers().await, vec!["Badge", "Name"]);
        assert_eq!(state.search_pool("grace").await.len(), 1);
    }

    #[tokio::test]
    async fn test_bad_csv_leaves_pool_unchanged() {
        let state = state().await;
        let result = state.import_csv("Badge,Name\nB1,Ada,oops\n").await;

        assert!(matches!(result, Err(DrawError::Import(_))));
        assert_eq!(state.get_pool().await.len(), 200);
        assert_eq!(state.get_headers().await.len(), 3);
    }

    #[tokio::test]
    async fn test_bad_import_leaves_pool_unchanged() {
        let state = state().await;
        let result = state.import_json("not json").await;
        assert!(matches!(result, Err(DrawError::Import(_))));
        assert_eq!(state.get_pool().await.len(), 200);
    }

    #[tokio::test]
    async fn test_import_json_replaces_pool() {
        let state = state().await;
        let imported = state
            .import_json(r#"[{"Name": "Ada"}, {"Name": "Grace"}]"#)
            .await
            .unwrap();

        assert_eq!(imported.participants.len(), 2);
        assert_eq!(state.get_headers().await, vec!["Name"]);
        assert_eq!(state.get_pool().await.len(), 2);
    }

    #[tokio::test]
    async fn test_edits_refused_while_rolling() {
        let state = state().await;
        state.start_draw().await.unwrap();

        assert!(matches!(
            state.set_preselected("mock-1", true).await,
            Err(DrawError::RollInProgress)
        ));
        assert!(matches!(
            state.clear_pool().await,
            Err(DrawError::RollInProgress)
        ));
        assert!(matches!(
            state.load_mock_pool().await,
            Err(DrawError::RollInProgress)
        ));
        assert_eq!(state.get_pool().await.len(), 200);
    }
}
