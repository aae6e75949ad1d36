//! Button action execution.
//!
//! Resolves a triggered button in a parsed definition, interpolates its
//! operation's templated fields against the current state, and dispatches
//! to the page-creation collaborator. The operation set is closed and
//! dispatched by exhaustive `match`, so every possible side effect is
//! visible here.
//!
//! Execution never mutates form state; a failed action leaves no partial
//! effects and is always safely retryable. Double-triggering the same
//! button before a prior execution resolves is not coordinated here;
//! callers should disable the trigger control while a request is
//! outstanding.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::form::types::{Block, FormDefinition, FormState, Operation};
use crate::template::interpolate;

/// Page-creation request handed to the collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePage {
    pub library_id: Uuid,
    pub workspace_id: Uuid,
    pub title: String,
    pub content: String,
    /// Target position in the workspace; append at end when unset.
    pub position: Option<i32>,
}

/// Collaborator that turns a `CreatePage` request into a stored page.
#[async_trait]
pub trait PageCreator: Send + Sync {
    async fn create_page(&self, request: CreatePage) -> AppResult<Uuid>;
}

/// Result of a successful action execution. The caller owns any follow-on
/// behavior (e.g., opening or streaming the generated page).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExecutionOutcome {
    PageGenerated { page_id: Uuid },
}

/// Executes button-triggered operations against workspace collaborators.
pub struct ActionExecutor {
    pages: Arc<dyn PageCreator>,
}

impl ActionExecutor {
    pub fn new(pages: Arc<dyn PageCreator>) -> Self {
        Self { pages }
    }

    /// Execute the operation behind `block_id`.
    ///
    /// The block must exist in the definition and be a button; anything
    /// else is an error with no side effect.
    pub async fn execute(
        &self,
        definition: &FormDefinition,
        library_id: Uuid,
        workspace_id: Uuid,
        block_id: &str,
        state: &FormState,
    ) -> AppResult<ExecutionOutcome> {
        let block = definition.get_block(block_id).ok_or_else(|| {
            AppError::NotFound(format!("Block '{}' not found in form", block_id))
        })?;

        let Block::Button(button) = block else {
            return Err(AppError::BadRequest(format!(
                "Block '{}' is a {} block, not a button",
                block_id,
                block.type_name()
            )));
        };

        match &button.workspace_operation {
            Operation::CreateCard(op) => {
                let title = interpolate(&op.title, state);
                let content = interpolate(&op.content, state);

                tracing::info!(
                    workspace_id = %workspace_id,
                    block_id = %block_id,
                    title = %title,
                    "Executing create_card operation"
                );

                let page_id = self
                    .pages
                    .create_page(CreatePage {
                        library_id,
                        workspace_id,
                        title,
                        content,
                        position: op.position,
                    })
                    .await?;

                Ok(ExecutionOutcome::PageGenerated { page_id })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::parser::parse_form;
    use crate::form::types::ParsedForm;

    fn definition(content: &str) -> FormDefinition {
        match parse_form(content).unwrap() {
            ParsedForm::Form(def) => def,
            ParsedForm::Empty => panic!("expected a form definition"),
        }
    }

    fn sample_definition() -> FormDefinition {
        definition(
            r#"
form:
  blocks:
    - block_type: textbox
      id: field1
      label: "Value"
    - block_type: button
      id: submit
      text: "Submit"
      action_type: workspace_operation
      workspace_operation:
        type: create_card
        title: "Result: {{field1.value}}"
        content: "Body for {{field1.value}}"
        position: 4
"#,
        )
    }

    fn state(pairs: &[(&str, &str)]) -> FormState {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[derive(Default)]
    struct MockPages {
        calls: std::sync::Mutex<Vec<CreatePage>>,
        fail_with: std::sync::Mutex<Option<String>>,
    }

    impl MockPages {
        fn failing(message: &str) -> Self {
            Self {
                calls: std::sync::Mutex::new(Vec::new()),
                fail_with: std::sync::Mutex::new(Some(message.to_string())),
            }
        }

        fn calls(&self) -> Vec<CreatePage> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageCreator for MockPages {
        async fn create_page(&self, request: CreatePage) -> AppResult<Uuid> {
            self.calls.lock().unwrap().push(request);
            if let Some(message) = self.fail_with.lock().unwrap().clone() {
                return Err(AppError::Conflict(message));
            }
            Ok(Uuid::new_v4())
        }
    }

    #[tokio::test]
    async fn test_create_card_dispatches_interpolated_fields() {
        let pages = Arc::new(MockPages::default());
        let executor = ActionExecutor::new(pages.clone());
        let def = sample_definition();
        let library_id = Uuid::new_v4();
        let workspace_id = Uuid::new_v4();

        let outcome = executor
            .execute(
                &def,
                library_id,
                workspace_id,
                "submit",
                &state(&[("field1", "42")]),
            )
            .await
            .unwrap();

        assert!(matches!(outcome, ExecutionOutcome::PageGenerated { .. }));
        let calls = pages.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].title, "Result: 42");
        assert_eq!(calls[0].content, "Body for 42");
        assert_eq!(calls[0].library_id, library_id);
        assert_eq!(calls[0].workspace_id, workspace_id);
        assert_eq!(calls[0].position, Some(4));
    }

    #[tokio::test]
    async fn test_missing_state_interpolates_to_empty() {
        let pages = Arc::new(MockPages::default());
        let executor = ActionExecutor::new(pages.clone());
        let def = sample_definition();

        executor
            .execute(
                &def,
                Uuid::new_v4(),
                Uuid::new_v4(),
                "submit",
                &FormState::new(),
            )
            .await
            .unwrap();

        assert_eq!(pages.calls()[0].title, "Result: ");
    }

    #[tokio::test]
    async fn test_unknown_block_is_error_without_side_effect() {
        let pages = Arc::new(MockPages::default());
        let executor = ActionExecutor::new(pages.clone());
        let def = sample_definition();

        let result = executor
            .execute(
                &def,
                Uuid::new_v4(),
                Uuid::new_v4(),
                "nope",
                &FormState::new(),
            )
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert!(pages.calls().is_empty());
    }

    #[tokio::test]
    async fn test_non_button_block_is_error_without_side_effect() {
        let pages = Arc::new(MockPages::default());
        let executor = ActionExecutor::new(pages.clone());
        let def = sample_definition();

        let result = executor
            .execute(
                &def,
                Uuid::new_v4(),
                Uuid::new_v4(),
                "field1",
                &FormState::new(),
            )
            .await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
        assert!(pages.calls().is_empty());
    }

    #[tokio::test]
    async fn test_collaborator_failure_propagates() {
        let pages = Arc::new(MockPages::failing("title already exists"));
        let executor = ActionExecutor::new(pages.clone());
        let def = sample_definition();
        let state = state(&[("field1", "42")]);

        let result = executor
            .execute(&def, Uuid::new_v4(), Uuid::new_v4(), "submit", &state)
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
        // The attempt reached the collaborator but committed nothing the
        // engine is responsible for; the input state is untouched.
        assert_eq!(state.get("field1"), Some(&"42".to_string()));
    }
}
