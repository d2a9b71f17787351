use async_trait::async_trait;

use super::Mailer;

/// Fallback when no relay is configured: logs instead of sending.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, _body_html: &str) -> anyhow::Result<()> {
        tracing::info!(to = %to, subject = %subject, "mail relay not configured, logging instead of sending");
        Ok(())
    }
}
