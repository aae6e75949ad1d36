//! Default state construction for form definitions.

use crate::form::types::{Block, FormDefinition, FormState};

/// Build the initial state for a definition: one empty-string entry per
/// stateful block, nothing for display-only and trigger blocks.
///
/// Deterministic and pure; the result is the baseline that persisted state
/// is merged over.
pub fn build_default_state(definition: &FormDefinition) -> FormState {
    let mut state = FormState::new();
    for block in &definition.blocks {
        match block {
            Block::Textbox(b) => {
                state.insert(b.id.clone(), String::new());
            }
            Block::Colour(b) => {
                state.insert(b.id.clone(), String::new());
            }
            Block::Text(_) | Block::Button(_) | Block::Equation(_) => {}
        }
    }
    state
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

    #[test]
    fn test_one_entry_per_stateful_block() {
        let def = definition(
            r#"
form:
  blocks:
    - block_type: text
      id: intro
      content: "hi"
    - block_type: textbox
      id: name
      label: "Name"
    - block_type: textbox
      id: notes
      label: "Notes"
      style: multi
    - block_type: colour
      id: accent
    - block_type: button
      id: submit
      text: "Go"
      action_type: workspace_operation
      workspace_operation:
        type: create_card
        title: "t"
        content: "c"
"#,
        );
        let state = build_default_state(&def);
        assert_eq!(state.len(), 3);
        assert_eq!(state.get("name"), Some(&String::new()));
        assert_eq!(state.get("notes"), Some(&String::new()));
        assert_eq!(state.get("accent"), Some(&String::new()));
        assert!(!state.contains_key("intro"));
        assert!(!state.contains_key("submit"));
    }

    #[test]
    fn test_no_stateful_blocks_yields_empty_state() {
        let def = definition(
            r#"
form:
  blocks:
    - block_type: text
      id: intro
      content: "display only"
"#,
        );
        assert!(build_default_state(&def).is_empty());
    }

    #[test]
    fn test_colour_definition_value_does_not_leak_into_defaults() {
        // The definition may carry an authored colour token; runtime state
        // still starts blank and the persisted layer decides the value.
        let def = definition(
            r##"
form:
  blocks:
    - block_type: colour
      id: accent
      value: "#ff0000"
"##,
        );
        let state = build_default_state(&def);
        assert_eq!(state.get("accent"), Some(&String::new()));
    }
}
