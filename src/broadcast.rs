//! Outbound replication at the authority
//!
//! Every envelope goes out on two transports: a broadcast channel for
//! co-located observers, and the durable mailbox through a single writer
//! task so mailbox writes land in emission order without blocking callers.

use crate::mailbox::Mailbox;
use crate::protocol::Envelope;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

/// Capacity of the direct broadcast channel
pub const DIRECT_CHANNEL_CAPACITY: usize = 64;

#[derive(Clone)]
pub struct Replicator {
    direct: broadcast::Sender<Envelope>,
    mailbox_queue: mpsc::UnboundedSender<Envelope>,
    mailbox: Arc<dyn Mailbox>,
}

impl Replicator {
    /// Must be called from within a tokio runtime: spawns the mailbox writer.
    pub fn new(mailbox: Arc<dyn Mailbox>) -> Self {
        let (direct, _rx) = broadcast::channel(DIRECT_CHANNEL_CAPACITY);
        let (tx, rx) = mpsc::unbounded_channel();

        spawn_mailbox_writer(mailbox.clone(), rx);

        Self {
            direct,
            mailbox_queue: tx,
            mailbox,
        }
    }

    /// Push an envelope onto both transports. Never fails.
    pub fn publish(&self, envelope: Envelope) {
        tracing::debug!(kind = envelope.kind(), "Replicating envelope");

        // Ignore send errors (no co-located observers is fine)
        let _ = self.direct.send(envelope.clone());

        if self.mailbox_queue.send(envelope).is_err() {
            tracing::warn!("Mailbox writer has stopped, durable transport unavailable");
        }
    }

    /// Subscribe to the direct transport
    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.direct.subscribe()
    }

    pub fn mailbox(&self) -> Arc<dyn Mailbox> {
        self.mailbox.clone()
    }

    /// Current mailbox value, `RESET` when it cannot be read
    pub async fn latest(&self) -> Envelope {
        match self.mailbox.read().await {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!(mailbox = self.mailbox.name(), "Mailbox read failed: {}", e);
                Envelope::Reset
            }
        }
    }
}

/// Drain the queue into the mailbox one write at a time. A failed write is
/// logged and left to be superseded by the next one.
fn spawn_mailbox_writer(mailbox: Arc<dyn Mailbox>, mut rx: mpsc::UnboundedReceiver<Envelope>) {
    tokio::spawn(async move {
        while let Some(envelope) = rx.recv().await {
            if let Err(e) = mailbox.write(&envelope).await {
                tracing::warn!(
                    mailbox = mailbox.name(),
                    kind = envelope.kind(),
                    "Mailbox write failed: {}",
                    e
                );
            }
        }
        tracing::debug!("Mailbox writer stopped");
    });
}
