//! HTTP surface: the run trigger and a liveness probe.
//!
//! Scheduling lives outside this service; an external cron hits `POST /run`
//! every two hours. The run lock keeps a late-finishing run and the next
//! trigger from racing on dedup: the overlapping caller gets 409.

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};
use uuid::Uuid;

use crate::config::Config;
use crate::notify::{self, RunReport};
use crate::pipeline::{self, RunSummary};

pub struct AppState {
    pub config: Config,
    pub run_lock: Mutex<()>,
}

#[derive(Debug, Serialize)]
pub struct RunResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub summary: Option<RunSummary>,
}

/// `POST /run`: execute one pipeline run to completion.
pub async fn trigger_run(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<RunResponse>) {
    let Ok(_guard) = state.run_lock.try_lock() else {
        return (
            StatusCode::CONFLICT,
            Json(RunResponse {
                run_id: None,
                status: "busy",
                error: Some("a run is already in progress".to_string()),
                summary: None,
            }),
        );
    };

    let run_id = Uuid::new_v4();
    info!("Run {} triggered", run_id);

    match pipeline::run_once(&state.config).await {
        Ok(summary) => {
            report(&state.config, run_id, Some(&summary), None).await;
            (
                StatusCode::OK,
                Json(RunResponse {
                    run_id: Some(run_id.to_string()),
                    status: "completed",
                    error: None,
                    summary: Some(summary),
                }),
            )
        }
        Err(e) => {
            error!("Run {} failed: {:#}", run_id, e);
            report(&state.config, run_id, None, Some(format!("{e:#}"))).await;
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(RunResponse {
                    run_id: Some(run_id.to_string()),
                    status: "failed",
                    error: Some(format!("{e:#}")),
                    summary: None,
                }),
            )
        }
    }
}

/// `GET /health`: liveness probe.
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn report(config: &Config, run_id: Uuid, summary: Option<&RunSummary>, error: Option<String>) {
    let Some(webhook_url) = config.webhook_url.as_deref() else {
        return;
    };

    let report = RunReport {
        run_id: run_id.to_string(),
        success: error.is_none(),
        scraped: summary.map(|s| s.scraped).unwrap_or(0),
        accepted: summary.map(|s| s.accepted).unwrap_or(0),
        appended: summary.map(|s| s.appended).unwrap_or(0),
        duplicates: summary.map(|s| s.duplicates).unwrap_or(0),
        groups_failed: summary.map(|s| s.groups_failed).unwrap_or(0),
        error,
        finished_at: Utc::now().to_rfc3339(),
    };
    notify::send_report(webhook_url, &report).await;
}
