/**
 * Document HTTP Handlers
 *
 * This module implements the request/response surface over
 * [`DocumentService`]:
 * - POST /documents - create an empty document
 * - POST /documents/import - register a full document payload
 * - GET /documents - list document ids
 * - GET /documents/{id} - snapshot plus catch-up history
 * - GET /documents/{id}/versions/{version} - historical snapshot
 * - POST /documents/{id}/operations - submit an operation batch
 * - POST /documents/{id}/group, /ungroup, /nodes/{nodeId}/align - composite intents
 * - POST /documents/{id}/generate - generator-proposed batch
 *
 * Bodies are parsed as raw JSON first so that every rejection, including
 * a malformed body, answers with the same JSON error shape.
 */

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::backend::collab::service::{DocumentService, Fetched};
use crate::backend::error::BackendError;
use crate::backend::generation::generate_and_apply;
use crate::backend::server::state::AppState;
use crate::shared::validation::validate_operations;
use crate::shared::{Document, ValidationError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDocumentRequest {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchQuery {
    pub since_version: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRequest {
    pub node_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UngroupRequest {
    pub container_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub instruction: String,
    #[serde(default)]
    pub palette: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VersionResponse {
    pub version: u64,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GroupResponse {
    pub version: u64,
    pub container_id: String,
}

fn json_body(payload: Result<Json<Value>, JsonRejection>) -> Result<Value, BackendError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| BackendError::handler(rejection.status(), rejection.body_text()))
}

fn typed_body<T: DeserializeOwned>(payload: Result<Json<Value>, JsonRejection>) -> Result<T, BackendError> {
    let value = json_body(payload)?;
    serde_json::from_value(value)
        .map_err(|e| BackendError::handler(StatusCode::BAD_REQUEST, format!("invalid request body: {}", e)))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn handle_list_documents(State(service): State<DocumentService>) -> Result<Json<Vec<String>>, BackendError> {
    Ok(Json(service.list()?))
}

pub async fn handle_create_document(
    State(service): State<DocumentService>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, BackendError> {
    let request: CreateDocumentRequest = typed_body(payload)?;
    let doc = service.create_document(request.width, request.height, request.title)?;
    Ok((StatusCode::CREATED, Json(doc)))
}

pub async fn handle_import_document(
    State(service): State<DocumentService>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, BackendError> {
    let value = json_body(payload)?;
    let doc = service.import_document(&value)?;
    Ok((StatusCode::CREATED, Json(doc)))
}

pub async fn handle_fetch_document(
    State(service): State<DocumentService>,
    Path(doc_id): Path<String>,
    query: Result<Query<FetchQuery>, QueryRejection>,
) -> Result<Json<Fetched>, BackendError> {
    let Query(query) =
        query.map_err(|rejection| BackendError::handler(rejection.status(), rejection.body_text()))?;
    tracing::debug!("[Collab] Fetch {} since {:?}", doc_id, query.since_version);
    Ok(Json(service.fetch(&doc_id, query.since_version)?))
}

pub async fn handle_snapshot_at(
    State(service): State<DocumentService>,
    Path((doc_id, version)): Path<(String, u64)>,
) -> Result<Json<Document>, BackendError> {
    Ok(Json(service.snapshot_at(&doc_id, version)?))
}

pub async fn handle_submit_operations(
    State(service): State<DocumentService>,
    Path(doc_id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<VersionResponse>, BackendError> {
    let body = json_body(payload)?;
    let raw = body
        .get("ops")
        .ok_or_else(|| ValidationError::single("ops", "is required"))?;
    let ops = validate_operations(raw)?;

    let applied = service.submit(&doc_id, ops).await?;
    Ok(Json(VersionResponse {
        version: applied.version,
    }))
}

pub async fn handle_group(
    State(service): State<DocumentService>,
    Path(doc_id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<GroupResponse>, BackendError> {
    let request: GroupRequest = typed_body(payload)?;
    let (applied, container_id) = service.group(&doc_id, &request.node_ids).await?;
    Ok(Json(GroupResponse {
        version: applied.version,
        container_id,
    }))
}

pub async fn handle_ungroup(
    State(service): State<DocumentService>,
    Path(doc_id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<VersionResponse>, BackendError> {
    let request: UngroupRequest = typed_body(payload)?;
    let applied = service.ungroup(&doc_id, &request.container_id).await?;
    Ok(Json(VersionResponse {
        version: applied.version,
    }))
}

pub async fn handle_align(
    State(service): State<DocumentService>,
    Path((doc_id, node_id)): Path<(String, String)>,
) -> Result<Json<VersionResponse>, BackendError> {
    let applied = service.align(&doc_id, &node_id).await?;
    Ok(Json(VersionResponse {
        version: applied.version,
    }))
}

pub async fn handle_generate(
    State(app_state): State<AppState>,
    Path(doc_id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<VersionResponse>, BackendError> {
    let request: GenerateRequest = typed_body(payload)?;
    let applied = generate_and_apply(
        &app_state.service,
        app_state.generator.as_deref(),
        &doc_id,
        request.instruction,
        request.palette,
        app_state.config.generation_timeout(),
    )
    .await?;
    Ok(Json(VersionResponse {
        version: applied.version,
    }))
}
