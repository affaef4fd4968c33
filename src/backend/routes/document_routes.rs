/**
 * Document Route Handlers
 *
 * # Routes
 *
 * ## Documents
 * - `GET /documents` - list document ids
 * - `POST /documents` - create a document
 * - `POST /documents/import` - register an existing document payload
 * - `GET /documents/{id}` - snapshot, optionally with `?sinceVersion=n`
 * - `GET /documents/{id}/versions/{version}` - snapshot at an earlier version
 *
 * ## Mutation
 * - `POST /documents/{id}/operations` - submit a batch
 * - `POST /documents/{id}/group` - group nodes under a new frame
 * - `POST /documents/{id}/ungroup` - dissolve a container
 * - `POST /documents/{id}/nodes/{node_id}/align` - lay out a container's children
 * - `POST /documents/{id}/generate` - apply a generator-proposed batch
 *
 * ## Live
 * - `GET /documents/{id}/subscribe` - WebSocket stream of hello + ops
 */

use axum::routing::{get, post};
use axum::Router;

use crate::backend::collab::handlers::{
    handle_align, handle_create_document, handle_fetch_document, handle_generate, handle_group,
    handle_import_document, handle_list_documents, handle_snapshot_at, handle_submit_operations,
    handle_ungroup,
};
use crate::backend::realtime::subscription::handle_document_subscription;
use crate::backend::server::state::AppState;

/// Add every document route to `router`
pub fn configure_document_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/documents", get(handle_list_documents).post(handle_create_document))
        .route("/documents/import", post(handle_import_document))
        .route("/documents/{doc_id}", get(handle_fetch_document))
        .route("/documents/{doc_id}/versions/{version}", get(handle_snapshot_at))
        .route("/documents/{doc_id}/operations", post(handle_submit_operations))
        .route("/documents/{doc_id}/group", post(handle_group))
        .route("/documents/{doc_id}/ungroup", post(handle_ungroup))
        .route("/documents/{doc_id}/nodes/{node_id}/align", post(handle_align))
        .route("/documents/{doc_id}/generate", post(handle_generate))
        .route("/documents/{doc_id}/subscribe", get(handle_document_subscription))
}
