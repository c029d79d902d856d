//! The HTTP surface. Everything except registration and the health probe is
//! authenticated with a bearer API key.

pub mod activity;
pub mod auth;
pub mod error;
pub mod reports;

use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{
    report::service::ReportService,
    storage::{activity_store::FileActivityStore, user_store::FileUserStore},
    utils::clock::{Clock, DefaultClock},
};

/// Shared state behind every handler.
pub struct AppState {
    pub clock: Box<dyn Clock>,
    pub activity_store: FileActivityStore,
    pub user_store: FileUserStore,
    pub reports: ReportService<FileActivityStore>,
}

pub type SharedState = Arc<AppState>;

pub async fn build_state(dir: PathBuf) -> Result<SharedState> {
    let activity_store = FileActivityStore::new(dir.join("records"))?;
    let user_store = FileUserStore::open(dir.join("users.json")).await?;
    let reports = ReportService::new(activity_store.clone(), Box::new(DefaultClock));

    Ok(Arc::new(AppState {
        clock: Box::new(DefaultClock),
        activity_store,
        user_store,
        reports,
    }))
}

pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(auth::register))
        .route("/auth/regenerate-api-key", post(auth::regenerate_api_key))
        .route("/activity", post(activity::create).get(activity::list))
        .route("/reports/daily", get(reports::daily))
        .route("/reports/weekly", get(reports::weekly))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

/// Runs the API server until the process is told to stop.
pub async fn serve(dir: PathBuf, port: u16) -> Result<()> {
    let state = build_state(dir).await?;
    let router = build_router(state);

    let shutdown_token = CancellationToken::new();
    tokio::spawn(detect_shutdown(shutdown_token.clone()));

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("Listening on port {port}");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown_token.cancelled().await })
        .await?;
    Ok(())
}

/// Detects signals sent to the process.
async fn detect_shutdown(cancellation: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        cancellation.cancel();
    }
}
