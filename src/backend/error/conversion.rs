/**
 * Error Conversion
 *
 * Backend errors implement `IntoResponse` so handlers can return them
 * directly.
 *
 * # Response Format
 *
 * ```json
 * {
 *   "error": "2 validation issue(s): ...",
 *   "status": 400,
 *   "issues": [{"path": "[0].node.width", "message": "must be at least 1"}]
 * }
 * ```
 *
 * `issues` is present only for validation failures.
 */

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::backend::error::types::BackendError;

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("[Server] {} -> {}", self, status);
        } else {
            tracing::debug!("[Server] {} -> {}", self, status);
        }

        let mut body = json!({
            "error": self.message(),
            "status": status.as_u16(),
        });
        if let Some(issues) = self.issues() {
            body["issues"] = json!(issues);
        }

        (status, Json(body)).into_response()
    }
}
