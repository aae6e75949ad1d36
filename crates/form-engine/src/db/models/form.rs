//! Form instance database model and API shapes.
//!
//! The instance row stores the raw DSL text (`content`, authoritative) and
//! the persisted field state (`form_data`); the parsed definition is always
//! derived, never stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::form::types::{FormDefinition, FormState, ValidationError};

/// Form instance attached to a workspace.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FormInstance {
    pub id: Uuid,

    /// Owning workspace.
    pub workspace_id: Uuid,

    /// Raw DSL text. Source of truth for the definition.
    pub content: String,

    /// Persisted field state (JSON object of block id -> value).
    pub form_data: serde_json::Value,

    /// Whether the instance renders collapsed in the workspace.
    pub is_collapsed: bool,

    /// Whether the instance's fields feed the workspace AI context.
    pub is_in_ai_context: bool,

    /// Position within the workspace.
    pub position: i32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FormInstance {
    /// Decode the persisted `form_data` into a `FormState`. Rows written by
    /// older builds may hold null or non-object data; those decode as empty.
    pub fn persisted_state(&self) -> FormState {
        serde_json::from_value(self.form_data.clone()).unwrap_or_default()
    }
}

/// Request to attach a new (empty) form instance to a workspace.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CreateFormRequest {
    /// Position within the workspace; append at end when unset.
    #[serde(default)]
    pub position: Option<i32>,
}

/// Partial update of an instance. Every field is optional and updated
/// independently; `content` and `form_data` in particular may be written
/// separately.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateFormRequest {
    #[serde(default)]
    pub content: Option<String>,

    #[serde(default)]
    pub form_data: Option<FormState>,

    #[serde(default)]
    pub is_collapsed: Option<bool>,

    #[serde(default)]
    pub is_in_ai_context: Option<bool>,

    #[serde(default)]
    pub position: Option<i32>,
}

/// API view of a form instance: the raw DSL, the parse outcome, and the
/// effective (merged) state. Invalid content still returns the editable raw
/// DSL together with the error details so authors can self-correct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormResponse {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub content: String,

    /// Parse outcome: "empty", "valid", or "invalid".
    pub status: String,

    /// Parsed definition when the content is valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<FormDefinition>,

    /// Per-block violations when the content is form-shaped but invalid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ValidationError>>,

    /// Parse failure message when the content is not form-shaped at all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_error: Option<String>,

    /// Effective field state (persisted values merged over defaults).
    pub state: FormState,

    pub is_collapsed: bool,
    pub is_in_ai_context: bool,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FormResponse {
    pub fn new(instance: FormInstance, status: &str, state: FormState) -> Self {
        Self {
            id: instance.id,
            workspace_id: instance.workspace_id,
            content: instance.content,
            status: status.to_string(),
            definition: None,
            errors: None,
            parse_error: None,
            state,
            is_collapsed: instance.is_collapsed,
            is_in_ai_context: instance.is_in_ai_context,
            position: instance.position,
            created_at: instance.created_at,
            updated_at: instance.updated_at,
        }
    }

    pub fn with_definition(mut self, definition: FormDefinition) -> Self {
        self.definition = Some(definition);
        self
    }

    pub fn with_errors(mut self, errors: Vec<ValidationError>) -> Self {
        self.errors = Some(errors);
        self
    }

    pub fn with_parse_error(mut self, message: String) -> Self {
        self.parse_error = Some(message);
        self
    }
}
