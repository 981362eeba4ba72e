//! Durable single-slot mailbox for replicated envelopes
//!
//! The slot holds exactly one value: every write fully replaces the previous
//! one and an empty slot reads back as `RESET`.

mod file;
mod http;

use async_trait::async_trait;
use tokio::sync::RwLock;

pub use file::FileMailbox;
pub use http::{HttpMailbox, DEFAULT_TIMEOUT as HTTP_TIMEOUT};

use crate::protocol::Envelope;

/// Result type for mailbox operations
pub type MailboxResult<T> = Result<T, MailboxError>;

/// Errors that can occur reading or writing the mailbox
#[derive(Debug, thiserror::Error)]
pub enum MailboxError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Envelope (de)serialization failed: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Mailbox unavailable: {0}")]
    Unavailable(String),
}

/// Storage medium behind the durable transport
#[async_trait]
pub trait Mailbox: Send + Sync {
    /// Latest envelope, or `Envelope::Reset` when nothing was written yet
    async fn read(&self) -> MailboxResult<Envelope>;

    /// Replace the stored envelope
    async fn write(&self, envelope: &Envelope) -> MailboxResult<()>;

    /// Name of this mailbox, for logging
    fn name(&self) -> &str;
}

/// In-process mailbox, for tests and single-process deployments
#[derive(Debug, Default)]
pub struct MemoryMailbox {
    slot: RwLock<Option<Envelope>>,
}

impl MemoryMailbox {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Mailbox for MemoryMailbox {
    async fn read(&self) -> MailboxResult<Envelope> {
        Ok(self.slot.read().await.clone().unwrap_or_default())
    }

    async fn write(&self, envelope: &Envelope) -> MailboxResult<()> {
        *self.slot.write().await = Some(envelope.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
