use super::{AppState, DrawError};
use crate::protocol::Envelope;
use crate::state::session::DrawSession;
use crate::types::*;
use rand::seq::SliceRandom;
use std::time::Duration;

fn now_millis() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

impl AppState {
    /// Current replicated draw state
    pub async fn draw_state(&self) -> DrawState {
        self.session.read().await.snapshot()
    }

    /// Draw state with an empty `active_pool`, for frequent pushes
    pub async fn draw_summary(&self) -> DrawState {
        self.session.read().await.summary()
    }

    /// Operator's saved configuration, used by the next Start
    pub async fn get_config(&self) -> DrawConfig {
        self.config.read().await.clone()
    }

    /// Replace the draw configuration (not allowed while rolling)
    pub async fn update_config(&self, config: DrawConfig) -> Result<DrawConfig, DrawError> {
        validate_config(&config)?;

        let session = self.session.read().await;
        if session.is_rolling() {
            return Err(DrawError::RollInProgress);
        }

        *self.config.write().await = config.clone();
        drop(session);

        tracing::info!(?config, "Draw configuration updated");
        Ok(config)
    }

    /// Start a roll: Idle/Revealed -> Rolling
    pub async fn start_draw(&self) -> Result<DrawState, DrawError> {
        let mut session = self.session.write().await;
        self.start_locked(&mut session).await
    }

    /// Stop the roll and reveal its winners: Rolling -> Revealed
    pub async fn stop_draw(&self) -> Result<Vec<Participant>, DrawError> {
        let mut session = self.session.write().await;
        self.cancel_auto_stop().await;
        self.stop_locked(&mut session).await
    }

    /// Spacebar behaviour: start when not rolling, stop otherwise
    pub async fn toggle_draw(&self) -> Result<DrawState, DrawError> {
        let mut session = self.session.write().await;
        if session.is_rolling() {
            self.cancel_auto_stop().await;
            self.stop_locked(&mut session).await?;
            Ok(session.snapshot())
        } else {
            self.start_locked(&mut session).await
        }
    }

    /// Any -> Idle. Pool, headers and history are left alone.
    pub async fn reset_draw(&self) -> DrawState {
        let mut session = self.session.write().await;
        self.cancel_auto_stop().await;
        session.reset();

        self.replicator.publish(Envelope::Reset);
        tracing::info!("Draw reset");
        session.snapshot()
    }

    /// Change the background in any phase
    pub async fn recolor(&self, color: String) -> Result<DrawState, DrawError> {
        let color = color.trim().to_string();
        if color.is_empty() {
            return Err(DrawError::InvalidConfig(
                "background color must not be empty".to_string(),
            ));
        }

        let mut session = self.session.write().await;
        session.recolor(&color);
        self.config.write().await.background_color = color.clone();

        tracing::info!("Background changed to {}", color);
        self.replicator
            .publish(Envelope::UpdateBackground { color });
        Ok(session.snapshot())
    }

    /// Timer callback for the roll started with `sequence`. A no-op unless
    /// that exact roll is still spinning.
    pub async fn auto_stop(&self, sequence: Sequence) {
        let mut session = self.session.write().await;
        if !session.is_rolling_sequence(sequence) {
            tracing::debug!(sequence, "Ignoring stale auto-stop");
            return;
        }

        // Detach instead of aborting: this code runs inside that task
        self.auto_stop.lock().await.take();

        tracing::info!(sequence, "Auto-stopping draw");
        if let Err(e) = self.stop_locked(&mut session).await {
            tracing::warn!("Auto-stop failed: {}", e);
        }
    }

    async fn start_locked(&self, session: &mut DrawSession) -> Result<DrawState, DrawError> {
        let pool = self.pool.read().await.clone();
        let headers = self.headers.read().await.clone();
        let config = self.config.read().await.clone();

        let sequence = {
            let mut rng = rand::rng();
            session.start(&pool, &headers, &config, now_millis(), &mut rng)?
        };
        let snapshot = session.snapshot();

        self.cancel_auto_stop().await;
        if config.duration_seconds > 0 {
            self.schedule_auto_stop(sequence, Duration::from_secs(config.duration_seconds as u64))
                .await;
        }

        self.replicator.publish(self.start_envelope(&snapshot));

        tracing::info!(
            sequence,
            pool = pool.len(),
            winner_count = config.winner_count,
            duration = config.duration_seconds,
            "Draw started"
        );
        Ok(snapshot)
    }

    async fn stop_locked(&self, session: &mut DrawSession) -> Result<Vec<Participant>, DrawError> {
        let winners = session.stop()?;
        let remove = session.snapshot().config.remove_winners_from_pool;

        {
            let mut pool = self.pool.write().await;
            if remove {
                pool.retain(|p| !winners.iter().any(|w| w.id == p.id));
            } else {
                for p in pool.iter_mut() {
                    if winners.iter().any(|w| w.id == p.id) {
                        p.is_preselected = false;
                    }
                }
            }
        }

        self.record_history(winners.clone()).await;
        self.replicator.publish(Envelope::StopRoll {
            winners: winners.clone(),
        });

        tracing::info!(
            sequence = session.sequence(),
            winners = winners.len(),
            removed = remove,
            "Draw stopped"
        );
        Ok(winners)
    }

    async fn schedule_auto_stop(&self, sequence: Sequence, after: Duration) {
        let state = self.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            state.auto_stop(sequence).await;
        });
        *self.auto_stop.lock().await = Some(handle);
    }

    async fn cancel_auto_stop(&self) {
        if let Some(handle) = self.auto_stop.lock().await.take() {
            handle.abort();
        }
    }

    /// START_ROLL for a snapshot. Oversized pools are replaced by a random
    /// sample; observers only use it for the spin animation.
    fn start_envelope(&self, snapshot: &DrawState) -> Envelope {
        let mut pool = snapshot.active_pool.clone();
        if pool.len() > self.max_replicated_pool {
            tracing::debug!(
                pool = pool.len(),
                limit = self.max_replicated_pool,
                "Sampling pool for replication"
            );
            pool.shuffle(&mut rand::rng());
            pool.truncate(self.max_replicated_pool);
        }

        let config = &snapshot.config;
        Envelope::StartRoll {
            count: config.winner_count,
            grid_columns: config.grid_columns,
            duration: config.duration_seconds,
            background_color: config.background_color.clone(),
            remove_winners: config.remove_winners_from_pool,
            pool: Some(pool),
            headers: Some(snapshot.headers.clone()),
            sequence: snapshot.sequence,
        }
    }
}

fn validate_config(config: &DrawConfig) -> Result<(), DrawError> {
    if config.winner_count < 1 || config.winner_count > MAX_WINNER_COUNT {
        return Err(DrawError::InvalidConfig(format!(
            "winner count must be between 1 and {}",
            MAX_WINNER_COUNT
        )));
    }
    if config.grid_columns > MAX_GRID_COLUMNS {
        return Err(DrawError::InvalidConfig(format!(
            "grid columns must be 0 (auto) or between 1 and {}",
            MAX_GRID_COLUMNS
        )));
    }
    if config.background_color.trim().is_empty() {
        return Err(DrawError::InvalidConfig(
            "background color must not be empty".to_string(),
        ));
    }
    Ok(())
}
