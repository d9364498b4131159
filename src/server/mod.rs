//! HTTP service for vote submission and leaderboard retrieval.
//!
//! ```text
//! POST /submit_vote  - validate and store one judge submission
//! GET  /results      - aggregate every stored record into a leaderboard
//! GET  /health       - liveness check
//! ```
//!
//! Every response carries CORS headers for the configured origin.

mod cors;
mod handlers;

use anyhow::{Context, Result};
use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::Config;
use crate::store::RecordStore;

/// State shared by all handlers. Immutable after startup.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn RecordStore>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn RecordStore>) -> Arc<Self> {
        Arc::new(Self { config, store })
    }
}

/// Builds the router with all routes and the CORS layer.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/submit_vote", post(handlers::submit_vote))
        .route("/results", get(handlers::results))
        .route("/health", get(handlers::health))
        .layer(middleware::from_fn_with_state(state.clone(), cors::cors))
        .with_state(state)
}

/// Serves the router on an already-bound listener until the process stops.
pub async fn serve_on(listener: TcpListener, state: Arc<AppState>) -> Result<()> {
    let addr = listener.local_addr()?;
    info!(%addr, prefix = %state.config.prefix, "Vote service listening");

    axum::serve(listener, build_router(state))
        .await
        .context("HTTP server failed")
}

/// Binds `bind` and serves until the process stops.
pub async fn serve(bind: &str, state: Arc<AppState>) -> Result<()> {
    let addr: SocketAddr = bind
        .parse()
        .with_context(|| format!("invalid bind address '{bind}'"))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    serve_on(listener, state).await
}
