//! Form DSL types.
//!
//! Typed model of a parsed form definition:
//! - `Block` as a closed tagged union keyed by `block_type`
//! - `Operation` as a closed tagged union keyed by `type`
//! - `FormState` as the per-instance mapping of stateful block ids to values
//!
//! The raw DSL text is always the source of truth; these types are derived
//! from it on demand and never persisted.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Per-instance field state: stateful block id -> current value.
pub type FormState = HashMap<String, String>;

/// Supported block kinds, in the order they are matched during validation.
pub const BLOCK_TYPES: &[&str] = &["text", "textbox", "button", "colour", "equation"];

/// Block visibility.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
}

/// Textbox rendering style.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TextboxStyle {
    #[default]
    Single,
    Multi,
}

/// Button action category. Closed set; currently only workspace operations.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    WorkspaceOperation,
}

/// Markdown display block. Non-stateful.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextBlock {
    pub id: String,
    #[serde(default)]
    pub visibility: Visibility,
    pub content: String,
}

/// Single- or multi-line text input. Stateful, value type string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextboxBlock {
    pub id: String,
    #[serde(default)]
    pub visibility: Visibility,
    pub label: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub style: TextboxStyle,
    #[serde(default)]
    pub placeholder: Option<String>,
}

/// Action trigger. Non-stateful.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ButtonBlock {
    pub id: String,
    #[serde(default)]
    pub visibility: Visibility,
    pub text: String,
    pub action_type: ActionType,
    pub workspace_operation: Operation,
}

/// Colour picker. Stateful, value is a colour token string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColourBlock {
    pub id: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub value: Option<String>,
}

/// Equation display block. Non-stateful.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EquationBlock {
    pub id: String,
    #[serde(default)]
    pub visibility: Visibility,
    pub content: String,
}

/// One atomic unit of form content.
///
/// Closed tagged union: adding a block type means adding one variant here and
/// one arm in the parser, the default state builder, and the executor. The
/// exhaustive matches in those components make a missed arm a compile error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "block_type", rename_all = "snake_case")]
pub enum Block {
    Text(TextBlock),
    Textbox(TextboxBlock),
    Button(ButtonBlock),
    Colour(ColourBlock),
    Equation(EquationBlock),
}

impl Block {
    /// The block's unique id within its definition.
    pub fn id(&self) -> &str {
        match self {
            Block::Text(b) => &b.id,
            Block::Textbox(b) => &b.id,
            Block::Button(b) => &b.id,
            Block::Colour(b) => &b.id,
            Block::Equation(b) => &b.id,
        }
    }

    /// Whether this block carries a per-instance value in `FormState`.
    pub fn is_stateful(&self) -> bool {
        matches!(self, Block::Textbox(_) | Block::Colour(_))
    }

    /// The DSL name of this block's type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Block::Text(_) => "text",
            Block::Textbox(_) => "textbox",
            Block::Button(_) => "button",
            Block::Colour(_) => "colour",
            Block::Equation(_) => "equation",
        }
    }
}

/// Workspace-side operation a button dispatches to.
///
/// Closed set resolved through exhaustive `match` in the executor, never
/// through reflection, so the possible side effects stay auditable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    CreateCard(CreateCardOperation),
}

/// Create a new page from templated, field-derived text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateCardOperation {
    /// Page title template; may reference `{{blockId.value}}`.
    pub title: String,

    /// Page content template; may reference `{{blockId.value}}`.
    pub content: String,

    /// Target position in the workspace; append at end when unset.
    #[serde(default)]
    pub position: Option<i32>,
}

/// Complete parsed form definition. Block order matches source order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FormDefinition {
    #[serde(default)]
    pub title: String,
    pub blocks: Vec<Block>,
}

impl FormDefinition {
    /// Get a block by id.
    pub fn get_block(&self, id: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id() == id)
    }

    /// All block ids in source order.
    pub fn block_ids(&self) -> Vec<&str> {
        self.blocks.iter().map(|b| b.id()).collect()
    }

    /// Ids of stateful blocks only, in source order.
    pub fn stateful_ids(&self) -> Vec<&str> {
        self.blocks
            .iter()
            .filter(|b| b.is_stateful())
            .map(|b| b.id())
            .collect()
    }
}

/// Outcome of parsing raw content.
///
/// `Empty` is the distinct "no form defined" state for empty or
/// whitespace-only content; callers must not confuse it with a validation
/// failure.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedForm {
    Empty,
    Form(FormDefinition),
}

impl ParsedForm {
    /// The definition, when content actually defines a form.
    pub fn definition(&self) -> Option<&FormDefinition> {
        match self {
            ParsedForm::Empty => None,
            ParsedForm::Form(def) => Some(def),
        }
    }
}

/// Reference to the block a validation error applies to.
///
/// Uses the block id when one is available, the source index otherwise
/// (missing or duplicated ids cannot be referenced by id).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum BlockRef {
    Id(String),
    Index(usize),
}

impl std::fmt::Display for BlockRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockRef::Id(id) => write!(f, "{}", id),
            BlockRef::Index(idx) => write!(f, "blocks[{}]", idx),
        }
    }
}

/// One schema violation found during validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationError {
    /// The offending block (id, or index when the id is unusable).
    pub block: BlockRef,

    /// The missing or invalid field, when the violation is field-level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,

    /// Human-readable description of the violation.
    pub message: String,
}

impl ValidationError {
    pub fn new(block: BlockRef, field: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            block,
            field: field.map(str::to_string),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{}: '{}': {}", self.block, field, self.message),
            None => write!(f, "{}: {}", self.block, self.message),
        }
    }
}

/// Failure modes of `parse_form`.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FormError {
    /// Content is not even shaped like a form (YAML error, wrong top level).
    #[error("content is not structured as a form: {0}")]
    Malformed(String),

    /// Content is form-shaped but violates the block schema.
    #[error("form validation failed with {} error(s)", .0.len())]
    Invalid(Vec<ValidationError>),
}
