//! Optional webhook notification with the run outcome.
//!
//! Fire-and-forget: a delivery failure is logged and never changes the run
//! result.

use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub success: bool,
    pub scraped: usize,
    pub accepted: usize,
    pub appended: usize,
    pub duplicates: usize,
    pub groups_failed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub finished_at: String,
}

pub async fn send_report(webhook_url: &str, report: &RunReport) {
    let client = reqwest::Client::new();
    match client.post(webhook_url).json(report).send().await {
        Ok(response) if response.status().is_success() => {
            info!("Webhook notified ({})", response.status());
        }
        Ok(response) => {
            warn!("Webhook returned {}", response.status());
        }
        Err(e) => {
            warn!("Webhook delivery failed: {}", e);
        }
    }
}
