//! Run result notifications.
//!
//! Notification is best-effort: a delivery failure is logged and never
//! changes the outcome of the run it reports on.

use crate::models::result::{RollbackOutcome, RollbackResult};
use crate::Result;
use async_trait::async_trait;
use serde::Serialize;

/// Sink for finished run results.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, result: &RollbackResult) -> Result<()>;
}

/// Webhook payload.
#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    text: String,
    result: &'a RollbackResult,
}

/// Notifier POSTing results to a webhook URL as JSON.
pub struct WebhookNotifier {
    url: String,
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .expect("Failed to create HTTP client");

        Self { url, client }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, result: &RollbackResult) -> Result<()> {
        let payload = WebhookPayload {
            text: render_summary(result),
            result,
        };

        let resp = self.client.post(&self.url).json(&payload).send().await?;

        if !resp.status().is_success() {
            return Err(crate::Error::other(format!(
                "webhook returned {}",
                resp.status()
            )));
        }

        tracing::info!(run_id = %result.run_id, "notification delivered");
        Ok(())
    }
}

/// Render a human-readable summary of a run.
pub fn render_summary(result: &RollbackResult) -> String {
    let headline = match result.outcome {
        RollbackOutcome::Success => format!(
            "Rollback of site '{}' completed successfully",
            result.site_name
        ),
        RollbackOutcome::AbortedAmbiguous => format!(
            "Rollback of site '{}' aborted: multiple archives in backup location",
            result.site_name
        ),
        RollbackOutcome::AbortedPrecondition => format!(
            "Rollback of site '{}' aborted: backup location empty or missing",
            result.site_name
        ),
        RollbackOutcome::Failed => format!("Rollback of site '{}' FAILED", result.site_name),
    };

    let mut lines = vec![
        headline,
        format!("Run id:      {}", result.run_id),
        format!("Started at:  {}", result.started_at.to_rfc3339()),
        format!("Finished at: {}", result.finished_at.to_rfc3339()),
    ];

    if let Some(step) = result.failed_step {
        lines.push(format!("Failed step: {}", step));
    }
    if let Some(ref error) = result.error {
        lines.push(format!("Error:       {}", error));
    }
    if let Some(ref backup) = result.preventive_backup {
        lines.push(format!("Preventive backup kept at: {}", backup.path));
    }

    lines.join("\n")
}
