//! Winner selection
//!
//! Preselected participants are taken first (in pool order), the rest is
//! filled uniformly at random, and the combined list is shuffled so forced
//! winners do not cluster at the front of the reveal.

use crate::types::Participant;
use rand::seq::SliceRandom;
use rand::Rng;

/// Pick up to `winner_count` winners from `pool` without mutating it.
///
/// Returns `min(winner_count, pool.len())` distinct participants.
pub fn select_winners<R: Rng + ?Sized>(
    pool: &[Participant],
    winner_count: usize,
    rng: &mut R,
) -> Vec<Participant> {
    let (preselected, mut others): (Vec<&Participant>, Vec<&Participant>) =
        pool.iter().partition(|p| p.is_preselected);

    let mut selected: Vec<Participant> = preselected
        .into_iter()
        .take(winner_count)
        .cloned()
        .collect();

    let remaining = winner_count.saturating_sub(selected.len());
    if remaining > 0 {
        others.shuffle(rng);
        selected.extend(others.into_iter().take(remaining).cloned());
    }

    selected.shuffle(rng);
    selected
}
