use super::*;
use std::io::ErrorKind;
use std::path::PathBuf;

/// Mailbox stored as a single JSON file
pub struct FileMailbox {
    path: PathBuf,
}

impl FileMailbox {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<tmp>/draw-state.json`
    pub fn default_path() -> PathBuf {
        std::env::temp_dir().join("draw-state.json")
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[async_trait]
impl Mailbox for FileMailbox {
    async fn read(&self) -> MailboxResult<Envelope> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Envelope::Reset),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, envelope: &Envelope) -> MailboxResult<()> {
        let bytes = serde_json::to_vec(envelope)?;

        // Write-then-rename so pollers never observe a half-written file
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_reads_reset() {
        let dir = tempfile::tempdir().unwrap();
        let mailbox = FileMailbox::new(dir.path().join("state.json"));
        assert_eq!(mailbox.read().await.unwrap(), Envelope::Reset);
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let mailbox = FileMailbox::new(dir.path().join("state.json"));

        let envelope = Envelope::StartRoll {
            count: 2,
            grid_columns: 3,
            duration: 0,
            background_color: "#16a34a".to_string(),
            remove_winners: false,
            pool: Some(vec![]),
            headers: Some(vec!["Name".to_string()]),
            sequence: 99,
        };
        mailbox.write(&envelope).await.unwrap();

        assert_eq!(mailbox.read().await.unwrap(), envelope);
        assert!(!dir.path().join("state.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, b"{not json").unwrap();

        let mailbox = FileMailbox::new(path);
        assert!(matches!(
            mailbox.read().await,
            Err(MailboxError::Codec(_))
        ));
    }
}
