//! HTTP surface for contract search.

use std::sync::Arc;

pub mod core;
pub mod error_handler;
mod routes;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::signal;
use tracing::{info, warn};

use crate::{
    core::app_state::AppState,
    error_handler::AppError,
    routes::{
        health::health_route::health_route, index_tasks::index_tasks_route::index_tasks_route,
        search_task::search_task_route::search_task_route,
    },
};

/// Builds the application router over shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/search_task", get(search_task_route))
        .route("/index_tasks", post(index_tasks_route))
        .route("/health", get(health_route))
        .with_state(state)
}

/// Serves the router on `address` until Ctrl+C.
///
/// # Errors
/// [`AppError::Bind`] when the address cannot be bound, [`AppError::Server`]
/// when the server loop fails.
pub async fn start(state: Arc<AppState>, address: &str) -> Result<(), AppError> {
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|source| AppError::Bind {
            address: address.to_string(),
            source,
        })?;

    info!(%address, "api listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!("api stopped");
    Ok(())
}

/// Resolves when Ctrl+C is pressed.
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests;
