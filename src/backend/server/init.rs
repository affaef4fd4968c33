/**
 * Server Initialization
 *
 * This module builds the application state and the router, and starts
 * the background maintenance task.
 *
 * # Initialization Process
 *
 * 1. Create the document service over an in-memory store, sizing
 *    subscriber channels from the configuration
 * 2. Attach the operation generator, when one is supplied
 * 3. Create and configure the router
 * 4. Start the periodic cleanup of closed subscriber channels
 */

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::task::JoinHandle;

use crate::backend::collab::service::DocumentService;
use crate::backend::generation::OperationGenerator;
use crate::backend::routes::router::create_router;
use crate::backend::server::config::ServerConfig;
use crate::backend::server::state::AppState;

/// How often closed subscriber channels are swept
pub const CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// Build application state from configuration
pub fn build_state(config: ServerConfig, generator: Option<Arc<dyn OperationGenerator>>) -> AppState {
    let state = AppState::new(config);
    match generator {
        Some(generator) => {
            tracing::info!("[Server] Operation generator attached");
            state.with_generator(generator)
        }
        None => {
            tracing::info!("[Server] No operation generator configured; /generate will answer 503");
            state
        }
    }
}

/// Create and configure the Axum application
pub fn create_app(app_state: AppState) -> Router<()> {
    tracing::info!(
        "[Server] Initializing xfcanvas (subscriber buffer {}, generation timeout {}s)",
        app_state.config.subscriber_buffer,
        app_state.config.generation_timeout_secs
    );

    let app = create_router(app_state.clone());
    spawn_cleanup_task(app_state.service, CLEANUP_INTERVAL);

    tracing::info!("[Server] Router configured with periodic cleanup task");
    app
}

/// Periodically forget subscriber channels whose connection has ended
pub fn spawn_cleanup_task(service: DocumentService, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            let removed = service.broadcaster().prune_closed();
            if removed > 0 {
                tracing::debug!("[Server] Pruned {} closed subscriber channels", removed);
            }
        }
    })
}
