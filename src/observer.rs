//! Observer runtime
//!
//! Two independent producers (direct broadcast listener, mailbox poller)
//! feed one reducer task that owns the `Mirror`. The mirror is published
//! through a watch channel; dropping the `Observer` stops every task.

use crate::mailbox::Mailbox;
use crate::protocol::Envelope;
use crate::replica::{Applied, Mirror};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Recommended mailbox polling interval
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Which transport delivered an envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Direct,
    Mailbox,
}

pub struct Observer {
    mirror: watch::Receiver<Mirror>,
    tasks: Vec<JoinHandle<()>>,
}

impl Observer {
    /// Start mirroring. Either transport may be absent; with neither the
    /// mirror simply stays at `initial`.
    pub fn spawn(
        initial: Mirror,
        direct: Option<broadcast::Receiver<Envelope>>,
        mailbox: Option<Arc<dyn Mailbox>>,
        poll_interval: Duration,
    ) -> Self {
        let (tx, rx) = mpsc::channel(64);
        let (mirror_tx, mirror_rx) = watch::channel(initial);
        let mut tasks = Vec::new();

        if let Some(direct) = direct {
            tasks.push(tokio::spawn(listen_direct(direct, tx.clone())));
        }
        if let Some(mailbox) = mailbox {
            tasks.push(tokio::spawn(poll_mailbox(mailbox, poll_interval, tx.clone())));
        }
        drop(tx);

        tasks.push(tokio::spawn(reduce(rx, mirror_tx)));

        Self {
            mirror: mirror_rx,
            tasks,
        }
    }

    /// Live view of the mirror
    pub fn mirror(&self) -> watch::Receiver<Mirror> {
        self.mirror.clone()
    }

    pub fn current(&self) -> Mirror {
        self.mirror.borrow().clone()
    }

    /// Stop polling and listening
    pub fn shutdown(self) {
        drop(self);
    }
}

impl Drop for Observer {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

async fn listen_direct(
    mut rx: broadcast::Receiver<Envelope>,
    tx: mpsc::Sender<(Transport, Envelope)>,
) {
    loop {
        match rx.recv().await {
            Ok(envelope) => {
                if tx.send((Transport::Direct, envelope)).await.is_err() {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                // The mailbox poll will catch us up
                tracing::warn!(skipped, "Direct transport lagged");
            }
            Err(broadcast::error::RecvError::Closed) => {
                tracing::debug!("Direct transport closed");
                break;
            }
        }
    }
}

async fn poll_mailbox(
    mailbox: Arc<dyn Mailbox>,
    every: Duration,
    tx: mpsc::Sender<(Transport, Envelope)>,
) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut healthy = true;

    loop {
        ticker.tick().await;

        match mailbox.read().await {
            Ok(envelope) => {
                if !healthy {
                    tracing::info!(mailbox = mailbox.name(), "Mailbox reachable again");
                    healthy = true;
                }
                if tx.send((Transport::Mailbox, envelope)).await.is_err() {
                    break;
                }
            }
            Err(e) if healthy => {
                tracing::warn!(mailbox = mailbox.name(), "Mailbox poll failed: {}", e);
                healthy = false;
            }
            Err(e) => {
                tracing::debug!(mailbox = mailbox.name(), "Mailbox still failing: {}", e);
            }
        }
    }
}

async fn reduce(mut rx: mpsc::Receiver<(Transport, Envelope)>, mirror: watch::Sender<Mirror>) {
    while let Some((transport, envelope)) = rx.recv().await {
        let kind = envelope.kind();
        let sequence = envelope.sequence();

        mirror.send_if_modified(|m| match m.apply(envelope) {
            Applied::Applied => {
                tracing::debug!(?transport, kind, ?sequence, phase = ?m.phase, "Applied envelope");
                true
            }
            Applied::Stale => {
                tracing::trace!(?transport, kind, ?sequence, "Discarded stale envelope");
                false
            }
            Applied::Unchanged => false,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::ImportedPool;
    use crate::mailbox::MemoryMailbox;
    use crate::state::AppState;
    use crate::types::*;

    async fn authority(mailbox: Arc<MemoryMailbox>) -> AppState {
        let state = AppState::with_mailbox(mailbox, 100);
        state
            .import_pool(ImportedPool {
                headers: vec!["Name".to_string()],
                participants: (0..10)
                    .map(|i| Participant {
                        id: format!("p-{}", i),
                        fields: [("Name".to_string(), format!("P{}", i))]
                            .into_iter()
                            .collect(),
                        is_preselected: false,
                    })
                    .collect(),
            })
            .await
            .unwrap();
        state
            .update_config(DrawConfig {
                winner_count: 3,
                duration_seconds: 0,
                remove_winners_from_pool: false,
                ..DrawConfig::default()
            })
            .await
            .unwrap();
        state
    }

    #[tokio::test(start_paused = true)]
    async fn test_both_transports_converge() {
        let mailbox = Arc::new(MemoryMailbox::new());
        let state = authority(mailbox.clone()).await;

        let observer = Observer::spawn(
            Mirror::default(),
            Some(state.replicator().subscribe()),
            Some(mailbox as Arc<dyn Mailbox>),
            DEFAULT_POLL_INTERVAL,
        );

        let started = state.start_draw().await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let mirror = observer.current();
        assert_eq!(mirror.phase, DrawPhase::Rolling);
        assert_eq!(mirror.last_sequence, started.sequence);
        assert_eq!(mirror.display_count, 3);
        assert_eq!(mirror.pool.len(), 10);

        // Several polls redeliver the same START: still one roll
        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(observer.current(), mirror);

        let winners = state.stop_draw().await.unwrap();
        tokio::time::sleep(Duration::from_millis(2500)).await;

        let mirror = observer.current();
        assert_eq!(mirror.phase, DrawPhase::Revealed);
        assert_eq!(mirror.winners, winners);
        assert!(mirror.celebrate);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mailbox_only_observer_catches_up() {
        let mailbox = Arc::new(MemoryMailbox::new());
        let state = authority(mailbox.clone()).await;

        let observer = Observer::spawn(
            Mirror::default(),
            None,
            Some(mailbox as Arc<dyn Mailbox>),
            DEFAULT_POLL_INTERVAL,
        );

        let started = state.start_draw().await.unwrap();
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(observer.current().last_sequence, started.sequence);
        assert!(observer.current().is_rolling());

        state.recolor("#16a34a".to_string()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(observer.current().background_color, "#16a34a");
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_joiner_after_reveal_waits_for_next_roll() {
        let mailbox = Arc::new(MemoryMailbox::new());
        let state = authority(mailbox.clone()).await;

        state.start_draw().await.unwrap();
        state.stop_draw().await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let observer = Observer::spawn(
            Mirror::default(),
            None,
            Some(mailbox as Arc<dyn Mailbox>),
            DEFAULT_POLL_INTERVAL,
        );
        tokio::time::sleep(Duration::from_millis(1100)).await;

        let mirror = observer.current();
        assert_eq!(mirror.phase, DrawPhase::Idle);
        assert!(mirror.winners.is_empty());

        state.start_draw().await.unwrap();
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(observer.current().is_rolling());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_tasks() {
        let mailbox = Arc::new(MemoryMailbox::new());
        let observer = Observer::spawn(
            Mirror::default(),
            None,
            Some(mailbox as Arc<dyn Mailbox>),
            DEFAULT_POLL_INTERVAL,
        );
        let mut rx = observer.mirror();

        observer.shutdown();

        let result = tokio::time::timeout(Duration::from_secs(5), rx.changed()).await;
        assert!(matches!(result, Ok(Err(_))), "mirror sender should be gone");
    }
}
