//! Action execution API handler.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::engine::executor::ExecutionOutcome;
use crate::error::AppResult;
use crate::form::types::FormState;
use crate::services::FormService;

/// Request to execute a button action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteRequest {
    /// Workspace the form belongs to.
    pub workspace_id: Uuid,

    /// The button block to trigger.
    pub block_id: String,

    /// The caller's current field state snapshot.
    #[serde(default)]
    pub form_state: FormState,
}

/// Response for a successful execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteResponse {
    pub result: ExecutionOutcome,
}

/// Execute a button action.
///
/// `POST /api/forms/{form_id}/execute`
///
/// # Request Body
///
/// ```json
/// {
///   "workspace_id": "...",
///   "block_id": "submit",
///   "form_state": { "field1": "42" }
/// }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "result": { "type": "page_generated", "page_id": "..." }
/// }
/// ```
///
/// A failed execution leaves the form's DSL and field state untouched and
/// is safe to retry. Concurrent triggers of the same button are not
/// serialized here; clients should disable the control while a request is
/// outstanding if duplicate side effects must be prevented.
pub async fn execute(
    State(service): State<FormService>,
    Path(form_id): Path<Uuid>,
    Json(request): Json<ExecuteRequest>,
) -> AppResult<Json<ExecuteResponse>> {
    debug!(
        form_id = %form_id,
        workspace_id = %request.workspace_id,
        block_id = %request.block_id,
        "Execute request"
    );

    let result = service
        .execute(
            form_id,
            request.workspace_id,
            &request.block_id,
            &request.form_state,
        )
        .await?;

    Ok(Json(ExecuteResponse { result }))
}
