use anyhow::Context;
use async_trait::async_trait;

use super::Mailer;

/// Sends mail through an HTTP relay (Resend-style JSON API).
pub struct RelayMailer {
    relay_url: String,
    api_key: String,
    from: String,
    client: reqwest::Client,
}

impl RelayMailer {
    pub fn new(relay_url: String, api_key: String, from: String) -> Self {
        Self {
            relay_url,
            api_key,
            from,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Mailer for RelayMailer {
    async fn send(&self, to: &str, subject: &str, body_html: &str) -> anyhow::Result<()> {
        self.client
            .post(&self.relay_url)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "from": self.from,
                "to": [to],
                "subject": subject,
                "html": body_html,
            }))
            .send()
            .await
            .context("failed to reach mail relay")?
            .error_for_status()
            .context("mail relay returned error")?;

        Ok(())
    }
}
