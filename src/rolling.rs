//! Rolling units: the per-slot spin animation on an observer
//!
//! A unit spins while its mirror is rolling, lands on its winner when the
//! roll is revealed, and otherwise shows a static pick from the pool.

use crate::replica::Mirror;
use crate::types::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitState {
    #[default]
    Idle,
    Spinning,
    Settled,
}

#[derive(Debug, Clone)]
pub struct RollingUnit {
    index: usize,
    state: UnitState,
    current: Option<Participant>,
}

impl RollingUnit {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            state: UnitState::Idle,
            current: None,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn state(&self) -> UnitState {
        self.state
    }

    /// Participant currently on screen
    pub fn current(&self) -> Option<&Participant> {
        self.current.as_ref()
    }

    /// Follow a change of the mirror
    pub fn sync<R: Rng + ?Sized>(&mut self, mirror: &Mirror, rng: &mut R) {
        if mirror.is_rolling() && !mirror.pool.is_empty() {
            self.state = UnitState::Spinning;
            return;
        }

        if let Some(winner) = mirror.winner_for(self.index) {
            self.state = UnitState::Settled;
            self.current = Some(winner.clone());
            return;
        }

        // Leaving a spin, or nothing shown yet: settle on a random face
        let reshuffle = self.state == UnitState::Spinning || self.current.is_none();
        self.state = UnitState::Idle;
        if reshuffle {
            if let Some(p) = pick(&mirror.pool, rng) {
                self.current = Some(p.clone());
            }
        }
    }

    /// Advance one animation frame. Returns whether the face changed.
    pub fn tick<R: Rng + ?Sized>(&mut self, pool: &[Participant], rng: &mut R) -> bool {
        if self.state != UnitState::Spinning {
            return false;
        }
        match pick(pool, rng) {
            Some(p) => {
                self.current = Some(p.clone());
                true
            }
            None => false,
        }
    }

    pub fn view(&self, headers: &[String]) -> UnitView {
        UnitView {
            index: self.index,
            state: self.state,
            fields: self
                .current
                .as_ref()
                .map(|p| p.display_fields(headers))
                .unwrap_or_default(),
        }
    }
}

fn pick<'a, R: Rng + ?Sized>(pool: &'a [Participant], rng: &mut R) -> Option<&'a Participant> {
    if pool.is_empty() {
        None
    } else {
        pool.get(rng.random_range(0..pool.len()))
    }
}

/// What a slot renders
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitView {
    pub index: usize,
    pub state: UnitState,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct SpinTiming {
    /// Time between frames
    pub tick: Duration,
    /// Delay before the first frame of a new roll
    pub grace: Duration,
}

impl Default for SpinTiming {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(50),
            grace: Duration::from_millis(50),
        }
    }
}

/// One unit per display slot, driven by a mirror
pub struct RollingGrid {
    views: watch::Receiver<Vec<UnitView>>,
    task: JoinHandle<()>,
}

impl RollingGrid {
    pub fn spawn(mirror: watch::Receiver<Mirror>, timing: SpinTiming) -> Self {
        let (tx, views) = watch::channel(Vec::new());
        let task = tokio::spawn(run_grid(mirror, timing, tx));
        Self { views, task }
    }

    pub fn views(&self) -> watch::Receiver<Vec<UnitView>> {
        self.views.clone()
    }

    pub fn current(&self) -> Vec<UnitView> {
        self.views.borrow().clone()
    }
}

impl Drop for RollingGrid {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_grid(
    mut mirror: watch::Receiver<Mirror>,
    timing: SpinTiming,
    views: watch::Sender<Vec<UnitView>>,
) {
    let mut rng = StdRng::from_rng(&mut rand::rng());
    let mut units: Vec<RollingUnit> = Vec::new();
    let mut ticker = tokio::time::interval(timing.tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let snapshot = mirror.borrow_and_update().clone();
    let mut was_rolling = snapshot.is_rolling();
    sync_units(&mut units, &snapshot, &mut rng);
    let _ = views.send(render(&units, &snapshot.headers));

    loop {
        tokio::select! {
            changed = mirror.changed() => {
                if changed.is_err() {
                    tracing::debug!("Mirror closed, stopping rolling units");
                    break;
                }
                let snapshot = mirror.borrow_and_update().clone();
                sync_units(&mut units, &snapshot, &mut rng);

                if snapshot.is_rolling() && !was_rolling {
                    ticker.reset_at(Instant::now() + timing.grace);
                }
                was_rolling = snapshot.is_rolling();

                let _ = views.send(render(&units, &snapshot.headers));
            }
            _ = ticker.tick() => {
                // Always spin over the latest replicated pool
                let (pool, headers) = {
                    let m = mirror.borrow();
                    (m.pool.clone(), m.headers.clone())
                };

                let mut moved = false;
                for unit in units.iter_mut() {
                    moved |= unit.tick(&pool, &mut rng);
                }
                if moved {
                    let _ = views.send(render(&units, &headers));
                }
            }
        }
    }
}

fn sync_units<R: Rng + ?Sized>(units: &mut Vec<RollingUnit>, mirror: &Mirror, rng: &mut R) {
    let count = mirror.display_count as usize;
    units.truncate(count);
    while units.len() < count {
        units.push(RollingUnit::new(units.len()));
    }
    for unit in units.iter_mut() {
        unit.sync(mirror, rng);
    }
}

fn render(units: &[RollingUnit], headers: &[String]) -> Vec<UnitView> {
    units.iter().map(|u| u.view(headers)).collect()
}
