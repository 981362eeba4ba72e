//! Observer-side mirror of the draw state
//!
//! Both transports feed the same reducer. START_ROLL is gated on its
//! sequence token so redelivery and stale polls cannot replay a roll;
//! every other envelope is applied as it arrives (last write wins).
//! A START_ROLL without a token (sequence 0, from writers that predate
//! tokens) is never stale, it only cannot restart a roll in progress.

use crate::protocol::Envelope;
use crate::types::*;
use std::sync::Arc;

/// Outcome of feeding one envelope to the mirror
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Applied,
    /// START_ROLL at or below the last accepted sequence
    Stale,
    /// Valid envelope that changed nothing
    Unchanged,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mirror {
    pub phase: DrawPhase,
    /// Number of slots on screen, 0 while waiting for the first roll
    pub display_count: u32,
    pub grid_columns: u32,
    pub duration_seconds: u32,
    pub background_color: String,
    pub remove_winners: bool,
    /// Shared so rolling units always read the latest replicated pool
    pub pool: Arc<Vec<Participant>>,
    pub headers: Vec<String>,
    pub winners: Vec<Participant>,
    pub last_sequence: Sequence,
    /// Set by a fresh reveal, cleared by the next roll or reset
    pub celebrate: bool,
}

impl Default for Mirror {
    fn default() -> Self {
        Self {
            phase: DrawPhase::Idle,
            display_count: 0,
            grid_columns: 0,
            duration_seconds: 0,
            background_color: DEFAULT_BACKGROUND.to_string(),
            remove_winners: false,
            pool: Arc::new(Vec::new()),
            headers: Vec::new(),
            winners: Vec::new(),
            last_sequence: 0,
            celebrate: false,
        }
    }
}

impl Mirror {
    /// Start from a known pool, e.g. a display's local copy of the list
    pub fn with_pool(headers: Vec<String>, pool: Vec<Participant>) -> Self {
        Self {
            headers,
            pool: Arc::new(pool),
            ..Self::default()
        }
    }

    pub fn is_rolling(&self) -> bool {
        self.phase == DrawPhase::Rolling
    }

    /// Winner assigned to display slot `index`, if any
    pub fn winner_for(&self, index: usize) -> Option<&Participant> {
        if self.phase == DrawPhase::Revealed {
            self.winners.get(index)
        } else {
            None
        }
    }

    pub fn apply(&mut self, envelope: Envelope) -> Applied {
        match envelope {
            Envelope::StartRoll {
                count,
                grid_columns,
                duration,
                background_color,
                remove_winners,
                pool,
                headers,
                sequence,
            } => {
                if sequence == 0 {
                    if self.is_rolling() {
                        return Applied::Unchanged;
                    }
                } else if sequence <= self.last_sequence {
                    return Applied::Stale;
                } else {
                    self.last_sequence = sequence;
                }

                self.display_count = count;
                self.grid_columns = grid_columns;
                self.duration_seconds = duration;
                if !background_color.is_empty() {
                    self.background_color = background_color;
                }
                self.remove_winners = remove_winners;
                if let Some(pool) = pool {
                    self.pool = Arc::new(pool);
                }
                if let Some(headers) = headers {
                    self.headers = headers;
                }
                self.winners.clear();
                self.celebrate = false;
                self.phase = DrawPhase::Rolling;
                Applied::Applied
            }

            Envelope::StopRoll { winners } => match self.phase {
                DrawPhase::Rolling => {
                    self.winners = winners;
                    self.phase = DrawPhase::Revealed;
                    self.celebrate = true;
                    Applied::Applied
                }
                DrawPhase::Revealed => {
                    if self.winners == winners {
                        Applied::Unchanged
                    } else {
                        // Late redelivery: sync without celebrating again
                        self.winners = winners;
                        Applied::Applied
                    }
                }
                DrawPhase::Idle => {
                    // Missed the START: nothing to reveal, only drop UI flags
                    self.celebrate = false;
                    Applied::Unchanged
                }
            },

            Envelope::Reset => {
                if self.phase == DrawPhase::Idle
                    && self.display_count == 0
                    && self.winners.is_empty()
                {
                    return Applied::Unchanged;
                }
                self.display_count = 0;
                self.winners.clear();
                self.celebrate = false;
                self.phase = DrawPhase::Idle;
                Applied::Applied
            }

            Envelope::UpdateBackground { color } => {
                if self.background_color == color {
                    Applied::Unchanged
                } else {
                    self.background_color = color;
                    Applied::Applied
                }
            }
        }
    }
}
