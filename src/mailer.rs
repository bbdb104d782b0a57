use anyhow::Result;
use async_trait::async_trait;

/// Delivery side of the password-reset flow. The core only produces a link;
/// how it reaches the user is the collaborator's problem.
#[async_trait]
pub trait ResetMailer: Send + Sync {
    async fn send_reset_link(&self, email: &str, reset_link: &str) -> Result<()>;
}

/// Default delivery: write the link to the log. Good enough for development
/// and for deployments that front this service with their own mail pipeline.
pub struct LogMailer;

#[async_trait]
impl ResetMailer for LogMailer {
    async fn send_reset_link(&self, email: &str, reset_link: &str) -> Result<()> {
        tracing::info!(%email, %reset_link, "password reset link issued");
        Ok(())
    }
}
