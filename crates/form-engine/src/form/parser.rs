//! Form DSL parser and validator.
//!
//! Parses YAML-shaped form descriptions into `FormDefinition` structures.
//! Validation walks the raw YAML tree so that every violation is reported,
//! one `ValidationError` per violation, each naming the offending block by
//! id (or by index when the id itself is missing or duplicated).
//!
//! Unknown block types are rejected here rather than rendered as
//! placeholders, so authored DSL and rendered output can never diverge.
//!
//! Parsing is pure: no I/O, and the same content always yields the same
//! result.

use std::collections::HashSet;

use serde_yaml::Value;

use crate::form::types::{
    ActionType, Block, BlockRef, ButtonBlock, ColourBlock, CreateCardOperation, EquationBlock,
    FormDefinition, FormError, Operation, ParsedForm, TextBlock, TextboxBlock, TextboxStyle,
    ValidationError, Visibility, BLOCK_TYPES,
};

/// Parse raw content into a form definition.
///
/// Empty or whitespace-only content is the distinct `ParsedForm::Empty`
/// state, not an error. Content that is not even shaped like a form returns
/// `FormError::Malformed`; form-shaped content with schema violations
/// returns `FormError::Invalid` carrying one error per violation.
pub fn parse_form(content: &str) -> Result<ParsedForm, FormError> {
    if content.trim().is_empty() {
        return Ok(ParsedForm::Empty);
    }

    let root: Value =
        serde_yaml::from_str(content).map_err(|e| FormError::Malformed(e.to_string()))?;

    let form = match root.get("form") {
        Some(form) if form.is_mapping() => form,
        Some(_) => {
            return Err(FormError::Malformed(
                "'form' must be a mapping".to_string(),
            ))
        }
        None => {
            return Err(FormError::Malformed(
                "missing top-level 'form' mapping".to_string(),
            ))
        }
    };

    let mut errors: Vec<ValidationError> = Vec::new();
    let form_ref = BlockRef::Id("form".to_string());

    let title = match form.get("title") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(_) => {
            errors.push(ValidationError::new(
                form_ref.clone(),
                Some("title"),
                "'title' must be a string",
            ));
            String::new()
        }
    };

    let items: &[Value] = match form.get("blocks") {
        None | Some(Value::Null) => &[],
        Some(Value::Sequence(seq)) => seq.as_slice(),
        Some(_) => {
            errors.push(ValidationError::new(
                form_ref,
                Some("blocks"),
                "'blocks' must be a sequence",
            ));
            &[]
        }
    };

    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut blocks: Vec<Block> = Vec::with_capacity(items.len());

    for (idx, item) in items.iter().enumerate() {
        if let Some(block) = parse_block(idx, item, &mut seen_ids, &mut errors) {
            blocks.push(block);
        }
    }

    if !errors.is_empty() {
        return Err(FormError::Invalid(errors));
    }

    Ok(ParsedForm::Form(FormDefinition { title, blocks }))
}

/// Validate and construct a single block. Pushes one error per violation;
/// returns the block only when it is fully valid.
fn parse_block(
    idx: usize,
    item: &Value,
    seen_ids: &mut HashSet<String>,
    errors: &mut Vec<ValidationError>,
) -> Option<Block> {
    let before = errors.len();

    if !item.is_mapping() {
        errors.push(ValidationError::new(
            BlockRef::Index(idx),
            None,
            "block must be a mapping",
        ));
        return None;
    }

    let mut id = match item.get("id") {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::String(_)) => {
            errors.push(ValidationError::new(
                BlockRef::Index(idx),
                Some("id"),
                "'id' must not be empty",
            ));
            None
        }
        Some(_) => {
            errors.push(ValidationError::new(
                BlockRef::Index(idx),
                Some("id"),
                "'id' must be a string",
            ));
            None
        }
        None => {
            errors.push(ValidationError::new(
                BlockRef::Index(idx),
                Some("id"),
                "missing required field 'id'",
            ));
            None
        }
    };

    // A duplicated id cannot name a block unambiguously, so the error (and
    // any further errors on this block) fall back to the index.
    if let Some(ref id_str) = id {
        if !seen_ids.insert(id_str.clone()) {
            errors.push(ValidationError::new(
                BlockRef::Index(idx),
                Some("id"),
                format!("duplicate block id '{}'", id_str),
            ));
            id = None;
        }
    }

    let bref = match &id {
        Some(id_str) => BlockRef::Id(id_str.clone()),
        None => BlockRef::Index(idx),
    };

    let block_type = match item.get("block_type") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            errors.push(ValidationError::new(
                bref.clone(),
                Some("block_type"),
                "'block_type' must be a string",
            ));
            None
        }
        None => {
            errors.push(ValidationError::new(
                bref.clone(),
                Some("block_type"),
                "missing required field 'block_type'",
            ));
            None
        }
    };

    let visibility = parse_visibility(item, &bref, errors);

    let block = match block_type.as_deref() {
        Some("text") => require_str(item, "text", "content", "", &bref, errors).map(|content| {
            Block::Text(TextBlock {
                id: id.clone().unwrap_or_default(),
                visibility,
                content,
            })
        }),
        Some("textbox") => {
            let label = require_str(item, "textbox", "label", "", &bref, errors);
            let required = optional_bool(item, "required", &bref, errors);
            let style = parse_style(item, &bref, errors);
            let placeholder = optional_str(item, "placeholder", "", &bref, errors);
            label.map(|label| {
                Block::Textbox(TextboxBlock {
                    id: id.clone().unwrap_or_default(),
                    visibility,
                    label,
                    required,
                    style,
                    placeholder,
                })
            })
        }
        Some("button") => {
            let text = require_str(item, "button", "text", "", &bref, errors);
            let action_type = parse_action_type(item, &bref, errors);
            let operation = parse_operation(item, &bref, errors);
            match (text, action_type, operation) {
                (Some(text), Some(action_type), Some(workspace_operation)) => {
                    Some(Block::Button(ButtonBlock {
                        id: id.clone().unwrap_or_default(),
                        visibility,
                        text,
                        action_type,
                        workspace_operation,
                    }))
                }
                _ => None,
            }
        }
        Some("colour") => {
            let value = optional_str(item, "value", "", &bref, errors);
            Some(Block::Colour(ColourBlock {
                id: id.clone().unwrap_or_default(),
                visibility,
                value,
            }))
        }
        Some("equation") => {
            require_str(item, "equation", "content", "", &bref, errors).map(|content| {
                Block::Equation(EquationBlock {
                    id: id.clone().unwrap_or_default(),
                    visibility,
                    content,
                })
            })
        }
        Some(other) => {
            errors.push(ValidationError::new(
                bref,
                Some("block_type"),
                format!(
                    "unknown block type '{}' (expected one of: {})",
                    other,
                    BLOCK_TYPES.join(", ")
                ),
            ));
            None
        }
        None => None,
    };

    if errors.len() > before || id.is_none() {
        return None;
    }
    block
}

/// `visibility` is optional and defaults to visible.
fn parse_visibility(
    item: &Value,
    bref: &BlockRef,
    errors: &mut Vec<ValidationError>,
) -> Visibility {
    match item.get("visibility") {
        None | Some(Value::Null) => Visibility::Visible,
        Some(Value::String(s)) if s == "visible" => Visibility::Visible,
        Some(Value::String(s)) if s == "hidden" => Visibility::Hidden,
        Some(_) => {
            errors.push(ValidationError::new(
                bref.clone(),
                Some("visibility"),
                "'visibility' must be 'visible' or 'hidden'",
            ));
            Visibility::Visible
        }
    }
}

/// `style` is optional and defaults to single.
fn parse_style(item: &Value, bref: &BlockRef, errors: &mut Vec<ValidationError>) -> TextboxStyle {
    match item.get("style") {
        None | Some(Value::Null) => TextboxStyle::Single,
        Some(Value::String(s)) if s == "single" => TextboxStyle::Single,
        Some(Value::String(s)) if s == "multi" => TextboxStyle::Multi,
        Some(_) => {
            errors.push(ValidationError::new(
                bref.clone(),
                Some("style"),
                "'style' must be 'single' or 'multi'",
            ));
            TextboxStyle::Single
        }
    }
}

fn parse_action_type(
    item: &Value,
    bref: &BlockRef,
    errors: &mut Vec<ValidationError>,
) -> Option<ActionType> {
    match item.get("action_type") {
        Some(Value::String(s)) if s == "workspace_operation" => Some(ActionType::WorkspaceOperation),
        Some(Value::String(s)) => {
            errors.push(ValidationError::new(
                bref.clone(),
                Some("action_type"),
                format!("unsupported action type '{}'", s),
            ));
            None
        }
        Some(_) => {
            errors.push(ValidationError::new(
                bref.clone(),
                Some("action_type"),
                "'action_type' must be a string",
            ));
            None
        }
        None => {
            errors.push(ValidationError::new(
                bref.clone(),
                Some("action_type"),
                "missing required field 'action_type'",
            ));
            None
        }
    }
}

/// Validate the `workspace_operation` mapping against the closed operation
/// set.
fn parse_operation(
    item: &Value,
    bref: &BlockRef,
    errors: &mut Vec<ValidationError>,
) -> Option<Operation> {
    let op = match item.get("workspace_operation") {
        Some(op) if op.is_mapping() => op,
        Some(_) => {
            errors.push(ValidationError::new(
                bref.clone(),
                Some("workspace_operation"),
                "'workspace_operation' must be a mapping",
            ));
            return None;
        }
        None => {
            errors.push(ValidationError::new(
                bref.clone(),
                Some("workspace_operation"),
                "missing required field 'workspace_operation'",
            ));
            return None;
        }
    };

    let op_type = match op.get("type") {
        Some(Value::String(s)) => s.clone(),
        Some(_) => {
            errors.push(ValidationError::new(
                bref.clone(),
                Some("workspace_operation.type"),
                "'type' must be a string",
            ));
            return None;
        }
        None => {
            errors.push(ValidationError::new(
                bref.clone(),
                Some("workspace_operation.type"),
                "missing required field 'type'",
            ));
            return None;
        }
    };

    match op_type.as_str() {
        "create_card" => {
            let title = require_str(op, "create_card", "title", "workspace_operation", bref, errors);
            let content =
                require_str(op, "create_card", "content", "workspace_operation", bref, errors);
            let position = optional_i32(op, "position", "workspace_operation", bref, errors);
            match (title, content) {
                (Some(title), Some(content)) => Some(Operation::CreateCard(CreateCardOperation {
                    title,
                    content,
                    position,
                })),
                _ => None,
            }
        }
        other => {
            errors.push(ValidationError::new(
                bref.clone(),
                Some("workspace_operation.type"),
                format!("unsupported operation type '{}'", other),
            ));
            None
        }
    }
}

fn field_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", prefix, field)
    }
}

fn require_str(
    value: &Value,
    context: &str,
    field: &str,
    prefix: &str,
    bref: &BlockRef,
    errors: &mut Vec<ValidationError>,
) -> Option<String> {
    let path = field_path(prefix, field);
    match value.get(field) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            errors.push(ValidationError::new(
                bref.clone(),
                Some(&path),
                format!("'{}' must be a string", field),
            ));
            None
        }
        None => {
            errors.push(ValidationError::new(
                bref.clone(),
                Some(&path),
                format!("{} requires field '{}'", context, field),
            ));
            None
        }
    }
}

fn optional_str(
    value: &Value,
    field: &str,
    prefix: &str,
    bref: &BlockRef,
    errors: &mut Vec<ValidationError>,
) -> Option<String> {
    let path = field_path(prefix, field);
    match value.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            errors.push(ValidationError::new(
                bref.clone(),
                Some(&path),
                format!("'{}' must be a string", field),
            ));
            None
        }
    }
}

fn optional_bool(
    value: &Value,
    field: &str,
    bref: &BlockRef,
    errors: &mut Vec<ValidationError>,
) -> bool {
    match value.get(field) {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(_) => {
            errors.push(ValidationError::new(
                bref.clone(),
                Some(field),
                format!("'{}' must be a boolean", field),
            ));
            false
        }
    }
}

fn optional_i32(
    value: &Value,
    field: &str,
    prefix: &str,
    bref: &BlockRef,
    errors: &mut Vec<ValidationError>,
) -> Option<i32> {
    let path = field_path(prefix, field);
    match value.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => match n.as_i64().and_then(|v| i32::try_from(v).ok()) {
            Some(v) => Some(v),
            None => {
                errors.push(ValidationError::new(
                    bref.clone(),
                    Some(&path),
                    format!("'{}' must be an integer", field),
                ));
                None
            }
        },
        Some(_) => {
            errors.push(ValidationError::new(
                bref.clone(),
                Some(&path),
                format!("'{}' must be an integer", field),
            ));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_FORM: &str = r#"
form:
  title: "My Form"
  blocks:
    - block_type: text
      id: intro
      content: "Fill this in"
    - block_type: textbox
      id: field1
      label: "Name:"
      required: true
      style: single
    - block_type: colour
      id: accent
    - block_type: equation
      id: eq1
      content: "x^2 + y^2 = r^2"
    - block_type: button
      id: submit
      text: "Submit"
      action_type: workspace_operation
      workspace_operation:
        type: create_card
        title: "Result: {{field1.value}}"
        content: "Generated content"
"#;

    fn parse_ok(content: &str) -> FormDefinition {
        match parse_form(content).unwrap() {
            ParsedForm::Form(def) => def,
            ParsedForm::Empty => panic!("expected a form definition"),
        }
    }

    fn parse_errors(content: &str) -> Vec<ValidationError> {
        match parse_form(content) {
            Err(FormError::Invalid(errors)) => errors,
            other => panic!("expected validation errors, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_valid_form() {
        let def = parse_ok(VALID_FORM);
        assert_eq!(def.title, "My Form");
        assert_eq!(def.blocks.len(), 5);
        assert_eq!(
            def.block_ids(),
            vec!["intro", "field1", "accent", "eq1", "submit"]
        );
        assert_eq!(def.stateful_ids(), vec!["field1", "accent"]);

        let Some(Block::Button(button)) = def.get_block("submit") else {
            panic!("expected button block");
        };
        let Operation::CreateCard(op) = &button.workspace_operation;
        assert_eq!(op.title, "Result: {{field1.value}}");
        assert_eq!(op.position, None);
    }

    #[test]
    fn test_block_order_matches_source_order() {
        let def = parse_ok(VALID_FORM);
        let types: Vec<&str> = def.blocks.iter().map(|b| b.type_name()).collect();
        assert_eq!(types, vec!["text", "textbox", "colour", "equation", "button"]);
    }

    #[test]
    fn test_parse_is_deterministic() {
        let first = parse_form(VALID_FORM).unwrap();
        let second = parse_form(VALID_FORM).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_content_is_no_form() {
        assert_eq!(parse_form("").unwrap(), ParsedForm::Empty);
        assert_eq!(parse_form("   \n\t  \n").unwrap(), ParsedForm::Empty);
    }

    #[test]
    fn test_malformed_content() {
        let result = parse_form("just a plain sentence");
        assert!(matches!(result, Err(FormError::Malformed(_))));

        let result = parse_form("form: 42");
        assert!(matches!(result, Err(FormError::Malformed(_))));

        let result = parse_form("title: no form key here");
        assert!(matches!(result, Err(FormError::Malformed(_))));
    }

    #[test]
    fn test_form_without_blocks_is_empty_definition() {
        let def = parse_ok("form:\n  title: \"Bare\"\n");
        assert_eq!(def.title, "Bare");
        assert!(def.blocks.is_empty());
    }

    #[test]
    fn test_missing_label_names_block_and_field() {
        let errors = parse_errors(
            r#"
form:
  blocks:
    - block_type: textbox
      id: field1
"#,
        );
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].block, BlockRef::Id("field1".to_string()));
        assert_eq!(errors[0].field.as_deref(), Some("label"));
    }

    #[test]
    fn test_missing_id_reported_by_index() {
        let errors = parse_errors(
            r#"
form:
  blocks:
    - block_type: text
      content: "hello"
"#,
        );
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].block, BlockRef::Index(0));
        assert_eq!(errors[0].field.as_deref(), Some("id"));
    }

    #[test]
    fn test_unknown_block_type_names_type_and_id() {
        let errors = parse_errors(
            r#"
form:
  blocks:
    - block_type: foo
      id: mystery
"#,
        );
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].block, BlockRef::Id("mystery".to_string()));
        assert!(errors[0].message.contains("foo"));
    }

    #[test]
    fn test_duplicate_block_id() {
        let errors = parse_errors(
            r#"
form:
  blocks:
    - block_type: text
      id: twice
      content: "a"
    - block_type: text
      id: twice
      content: "b"
"#,
        );
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].block, BlockRef::Index(1));
        assert!(errors[0].message.contains("duplicate block id 'twice'"));
    }

    #[test]
    fn test_button_requires_well_formed_operation() {
        let errors = parse_errors(
            r#"
form:
  blocks:
    - block_type: button
      id: submit
      text: "Go"
      action_type: workspace_operation
"#,
        );
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field.as_deref(), Some("workspace_operation"));
    }

    #[test]
    fn test_unsupported_operation_type() {
        let errors = parse_errors(
            r#"
form:
  blocks:
    - block_type: button
      id: submit
      text: "Go"
      action_type: workspace_operation
      workspace_operation:
        type: delete_everything
        title: "t"
        content: "c"
"#,
        );
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("delete_everything"));
    }

    #[test]
    fn test_unsupported_action_type() {
        let errors = parse_errors(
            r#"
form:
  blocks:
    - block_type: button
      id: submit
      text: "Go"
      action_type: shell_command
      workspace_operation:
        type: create_card
        title: "t"
        content: "c"
"#,
        );
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("shell_command"));
    }

    #[test]
    fn test_mistyped_fields_collect_multiple_errors() {
        let errors = parse_errors(
            r#"
form:
  blocks:
    - block_type: textbox
      id: field1
      label: 42
      required: "yes"
    - block_type: button
      id: submit
      text: "Go"
      action_type: workspace_operation
      workspace_operation:
        type: create_card
        title: "t"
        content: "c"
        position: "third"
"#,
        );
        assert_eq!(errors.len(), 3);
        assert!(errors
            .iter()
            .any(|e| e.field.as_deref() == Some("label") && e.message.contains("string")));
        assert!(errors
            .iter()
            .any(|e| e.field.as_deref() == Some("required") && e.message.contains("boolean")));
        assert!(errors.iter().any(|e| e.field.as_deref()
            == Some("workspace_operation.position")
            && e.message.contains("integer")));
    }

    #[test]
    fn test_blocks_must_be_a_sequence() {
        let errors = parse_errors("form:\n  blocks: \"nope\"\n");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field.as_deref(), Some("blocks"));
    }

    #[test]
    fn test_invalid_visibility() {
        let errors = parse_errors(
            r#"
form:
  blocks:
    - block_type: text
      id: intro
      content: "hi"
      visibility: translucent
"#,
        );
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field.as_deref(), Some("visibility"));
    }

    #[test]
    fn test_operation_position_parses() {
        let def = parse_ok(
            r#"
form:
  blocks:
    - block_type: button
      id: submit
      text: "Go"
      action_type: workspace_operation
      workspace_operation:
        type: create_card
        title: "t"
        content: "c"
        position: 2
"#,
        );
        let Some(Block::Button(button)) = def.get_block("submit") else {
            panic!("expected button");
        };
        let Operation::CreateCard(op) = &button.workspace_operation;
        assert_eq!(op.position, Some(2));
    }
}
