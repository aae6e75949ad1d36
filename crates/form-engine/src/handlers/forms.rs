//! Form API handlers.
//!
//! Endpoints for validating form DSL content and managing form instances
//! within a workspace.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::models::{CreateFormRequest, FormResponse, UpdateFormRequest};
use crate::error::AppResult;
use crate::form::defaults::build_default_state;
use crate::form::types::{FormDefinition, FormState, ParsedForm};
use crate::services::FormService;

/// Request to validate raw form content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateRequest {
    /// Raw DSL text.
    pub content: String,
}

/// Response for content validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateResponse {
    /// "valid" when content defines a form, "empty" when it defines none.
    pub status: String,

    /// Parsed definition for valid content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<FormDefinition>,

    /// Initial state derived from the definition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_state: Option<FormState>,
}

/// Request to apply a single field edit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditRequest {
    /// The stateful block to update.
    pub block_id: String,

    /// The new value.
    pub value: String,
}

/// Response after applying a field edit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditResponse {
    /// Effective state after the edit.
    pub state: FormState,
}

/// Validate raw form content.
///
/// `POST /api/forms/validate`
///
/// # Request Body
///
/// ```json
/// {
///   "content": "form:\n  title: \"My Form\"\n  blocks: ..."
/// }
/// ```
///
/// # Response
///
/// - `200 OK` with `{ "status": "valid", "definition": ..., "default_state": ... }`
/// - `200 OK` with `{ "status": "empty" }` for empty/whitespace content
/// - `422 Unprocessable Entity` with per-block errors for invalid content
/// - `400 Bad Request` for content that is not form-shaped at all
pub async fn validate(
    State(service): State<FormService>,
    Json(request): Json<ValidateRequest>,
) -> AppResult<Json<ValidateResponse>> {
    match service.validate(&request.content)? {
        ParsedForm::Empty => Ok(Json(ValidateResponse {
            status: "empty".to_string(),
            definition: None,
            default_state: None,
        })),
        ParsedForm::Form(definition) => {
            let default_state = build_default_state(&definition);
            Ok(Json(ValidateResponse {
                status: "valid".to_string(),
                definition: Some(definition),
                default_state: Some(default_state),
            }))
        }
    }
}

/// Attach a new empty form instance to a workspace.
///
/// `POST /api/workspaces/{workspace_id}/forms`
pub async fn create(
    State(service): State<FormService>,
    Path(workspace_id): Path<Uuid>,
    Json(request): Json<CreateFormRequest>,
) -> AppResult<(StatusCode, Json<FormResponse>)> {
    let response = service.create_form(workspace_id, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// List a workspace's form instances.
///
/// `GET /api/workspaces/{workspace_id}/forms`
pub async fn list(
    State(service): State<FormService>,
    Path(workspace_id): Path<Uuid>,
) -> AppResult<Json<Vec<FormResponse>>> {
    let responses = service.list_forms(workspace_id).await?;
    Ok(Json(responses))
}

/// Get a form instance with its parse outcome and effective state.
///
/// `GET /api/forms/{form_id}`
pub async fn get(
    State(service): State<FormService>,
    Path(form_id): Path<Uuid>,
) -> AppResult<Json<FormResponse>> {
    let response = service.get_form(form_id).await?;
    Ok(Json(response))
}

/// Partially update a form instance.
///
/// `PATCH /api/forms/{form_id}`
///
/// `content` (raw DSL) and `form_data` (field state) are independent; a
/// request may carry either, both, or neither.
pub async fn update(
    State(service): State<FormService>,
    Path(form_id): Path<Uuid>,
    Json(request): Json<UpdateFormRequest>,
) -> AppResult<Json<FormResponse>> {
    let response = service.update_form(form_id, request).await?;
    Ok(Json(response))
}

/// Apply a single field edit through the debounced state store.
///
/// `POST /api/forms/{form_id}/edits`
///
/// The in-memory effective state updates immediately; persistence happens
/// after the debounce window, with rapid edits coalescing into one write.
pub async fn edit(
    State(service): State<FormService>,
    Path(form_id): Path<Uuid>,
    Json(request): Json<EditRequest>,
) -> AppResult<Json<EditResponse>> {
    let state = service
        .apply_edit(form_id, &request.block_id, &request.value)
        .await?;
    Ok(Json(EditResponse { state }))
}

/// Destroy a form instance.
///
/// `DELETE /api/forms/{form_id}`
pub async fn delete(
    State(service): State<FormService>,
    Path(form_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    service.delete_form(form_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
