use axum::async_trait;
use tracing::info;

use crate::config::SmtpConfig;

/// Outbound email seam. Delivery itself is an external collaborator; the
/// default implementation only records the send so the rest of the flow
/// (OTP issuing, verification links) stays testable.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> anyhow::Result<()>;
}

pub struct LogMailer {
    from: String,
}

impl LogMailer {
    pub fn new(smtp: &SmtpConfig) -> Self {
        Self {
            from: smtp.from_address.clone(),
        }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> anyhow::Result<()> {
        info!(from = %self.from, to = %to, subject = %subject, bytes = html.len(), "email queued");
        Ok(())
    }
}
