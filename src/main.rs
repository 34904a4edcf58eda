mod api;
mod config;
mod dedup;
mod filter;
mod groups;
mod listing;
mod notify;
mod parser;
mod pipeline;
mod session;
mod sheets;
mod sites;
mod stealth;

use axum::{
    routing::{get, post},
    Router,
};
use dotenv::dotenv;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = config::Config::from_env()?;
    let bind_addr = config.bind_addr.clone();

    let state = Arc::new(api::AppState {
        config,
        run_lock: Mutex::new(()),
    });

    let app = Router::new()
        .route("/run", post(api::trigger_run))
        .route("/health", get(api::health))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
