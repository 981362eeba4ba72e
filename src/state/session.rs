//! The draw state machine
//!
//! `DrawSession` owns the replicated `DrawState` plus the winners held back
//! between Start and Stop. Every mutation goes through one of the four
//! transitions below; callers only ever see snapshots.

use super::DrawError;
use crate::selector::select_winners;
use crate::types::*;
use rand::Rng;

#[derive(Debug, Default)]
pub struct DrawSession {
    state: DrawState,
    pending: Vec<Participant>,
}

impl DrawSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> DrawPhase {
        self.state.phase
    }

    pub fn sequence(&self) -> Sequence {
        self.state.sequence
    }

    pub fn is_rolling(&self) -> bool {
        self.state.phase == DrawPhase::Rolling
    }

    /// True while the roll started with `sequence` is still spinning
    pub fn is_rolling_sequence(&self, sequence: Sequence) -> bool {
        self.is_rolling() && self.state.sequence == sequence
    }

    pub fn snapshot(&self) -> DrawState {
        self.state.clone()
    }

    /// Snapshot without the frozen pool
    pub fn summary(&self) -> DrawState {
        DrawState {
            phase: self.state.phase,
            active_pool: Vec::new(),
            headers: self.state.headers.clone(),
            winners: self.state.winners.clone(),
            config: self.state.config.clone(),
            sequence: self.state.sequence,
        }
    }

    /// Idle/Revealed -> Rolling. Freezes pool, headers and config, and
    /// computes the winners now so the reveal cannot drift from them.
    pub fn start<R: Rng + ?Sized>(
        &mut self,
        pool: &[Participant],
        headers: &[String],
        config: &DrawConfig,
        now_millis: u64,
        rng: &mut R,
    ) -> Result<Sequence, DrawError> {
        if self.is_rolling() {
            return Err(DrawError::RollInProgress);
        }

        self.pending = select_winners(pool, config.winner_count as usize, rng);
        self.state = DrawState {
            phase: DrawPhase::Rolling,
            active_pool: pool.to_vec(),
            headers: headers.to_vec(),
            winners: Vec::new(),
            config: config.clone(),
            sequence: next_sequence(self.state.sequence, now_millis),
        };

        Ok(self.state.sequence)
    }

    /// Rolling -> Revealed, publishing the winners held since Start
    pub fn stop(&mut self) -> Result<Vec<Participant>, DrawError> {
        if !self.is_rolling() {
            return Err(DrawError::NotRolling);
        }

        self.state.winners = std::mem::take(&mut self.pending);
        self.state.phase = DrawPhase::Revealed;
        Ok(self.state.winners.clone())
    }

    /// Any -> Idle. Pool snapshot, headers and sequence are kept.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.state.winners.clear();
        self.state.phase = DrawPhase::Idle;
    }

    /// Background change, valid in every phase
    pub fn recolor(&mut self, color: &str) {
        self.state.config.background_color = color.to_string();
    }
}

/// Monotonic within a process and, through the wall clock, across restarts
fn next_sequence(previous: Sequence, now_millis: u64) -> Sequence {
    previous.saturating_add(1).max(now_millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn pool(size: usize) -> Vec<Participant> {
        (0..size)
            .map(|i| Participant {
                id: format!("p-{}", i),
                fields: Default::default(),
                is_preselected: false,
            })
            .collect()
    }

    fn config(winner_count: u32) -> DrawConfig {
        DrawConfig {
            winner_count,
            ..DrawConfig::default()
        }
    }

    #[test]
    fn test_start_stop_round_trip() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut session = DrawSession::new();
        let pool = pool(10);

        let seq = session
            .start(&pool, &[], &config(3), 1_000, &mut rng)
            .unwrap();
        assert_eq!(session.phase(), DrawPhase::Rolling);
        assert!(session.snapshot().winners.is_empty());
        assert_eq!(session.snapshot().active_pool.len(), 10);
        assert!(session.is_rolling_sequence(seq));

        let winners = session.stop().unwrap();
        assert_eq!(winners.len(), 3);
        assert_eq!(session.phase(), DrawPhase::Revealed);
        assert_eq!(session.snapshot().winners, winners);
        assert!(!session.is_rolling_sequence(seq));
    }

    #[test]
    fn test_start_rejected_while_rolling() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut session = DrawSession::new();
        session
            .start(&pool(3), &[], &config(1), 1, &mut rng)
            .unwrap();

        let result = session.start(&pool(3), &[], &config(1), 2, &mut rng);
        assert!(matches!(result, Err(DrawError::RollInProgress)));
    }

    #[test]
    fn test_stop_requires_rolling() {
        let mut session = DrawSession::new();
        assert!(matches!(session.stop(), Err(DrawError::NotRolling)));
    }

    #[test]
    fn test_sequence_is_monotonic() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut session = DrawSession::new();

        let first = session
            .start(&pool(3), &[], &config(1), 500, &mut rng)
            .unwrap();
        session.stop().unwrap();

        // Clock went backwards: still strictly increasing
        let second = session
            .start(&pool(3), &[], &config(1), 10, &mut rng)
            .unwrap();
        assert_eq!(first, 500);
        assert_eq!(second, 501);
    }

    #[test]
    fn test_reset_clears_winners_only() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut session = DrawSession::new();
        let headers = vec!["Name".to_string()];
        session
            .start(&pool(5), &headers, &config(2), 7, &mut rng)
            .unwrap();
        session.stop().unwrap();

        session.reset();
        let snap = session.snapshot();
        assert_eq!(snap.phase, DrawPhase::Idle);
        assert!(snap.winners.is_empty());
        assert_eq!(snap.headers, headers);
        assert_eq!(snap.sequence, 7);
    }

    #[test]
    fn test_reset_discards_pending_winners() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut session = DrawSession::new();
        session
            .start(&pool(5), &[], &config(2), 1, &mut rng)
            .unwrap();
        session.reset();

        assert!(matches!(session.stop(), Err(DrawError::NotRolling)));
        assert!(session.snapshot().winners.is_empty());
    }

    #[test]
    fn test_recolor_keeps_phase() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut session = DrawSession::new();
        session
            .start(&pool(2), &[], &config(1), 1, &mut rng)
            .unwrap();

        session.recolor("#000000");
        assert_eq!(session.phase(), DrawPhase::Rolling);
        assert_eq!(session.snapshot().config.background_color, "#000000");
    }

    #[test]
    fn test_empty_pool_rolls_and_reveals_nothing() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut session = DrawSession::new();
        session.start(&[], &[], &config(3), 1, &mut rng).unwrap();
        assert_eq!(session.phase(), DrawPhase::Rolling);
        assert!(session.stop().unwrap().is_empty());
    }
}
