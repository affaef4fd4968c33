/**
 * Router Configuration
 *
 * This module provides the main router creation function that combines
 * all route configurations into a single Axum router.
 *
 * # Route Order
 *
 * 1. Health check
 * 2. Document routes (HTTP and WebSocket)
 * 3. Fallback handler (JSON 404)
 *
 * Every request passes through `TraceLayer`, which logs method, path,
 * status and latency under the `tower_http` target.
 */

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::backend::collab::handlers::health;
use crate::backend::error::BackendError;
use crate::backend::routes::document_routes::configure_document_routes;
use crate::backend::server::state::AppState;

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState) -> Router<()> {
    let router = Router::new().route("/health", get(health));

    let router = configure_document_routes(router);

    let router = router.fallback(|| async { BackendError::handler(StatusCode::NOT_FOUND, "no such route") });

    router.layer(TraceLayer::new_for_http()).with_state(app_state)
}
