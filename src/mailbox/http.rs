use super::*;
use std::time::Duration;

/// Request timeout used by the binary
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Mailbox living on a remote server's `/api/draw-state` endpoint
pub struct HttpMailbox {
    url: String,
    client: reqwest::Client,
}

impl HttpMailbox {
    /// `base_url` is the server root, e.g. `http://draw.local:6584`
    pub fn new(base_url: &str, timeout: Duration) -> MailboxResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            url: format!("{}/api/draw-state", base_url.trim_end_matches('/')),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Mailbox for HttpMailbox {
    async fn read(&self) -> MailboxResult<Envelope> {
        let envelope = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json::<Envelope>()
            .await?;
        Ok(envelope)
    }

    async fn write(&self, envelope: &Envelope) -> MailboxResult<()> {
        self.client
            .post(&self.url)
            .json(envelope)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_normalization() {
        let mailbox = HttpMailbox::new("http://localhost:6584/", Duration::from_secs(1)).unwrap();
        assert_eq!(mailbox.url(), "http://localhost:6584/api/draw-state");
    }
}
