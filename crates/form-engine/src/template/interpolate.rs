//! Restricted template interpolation.
//!
//! Substitutes `{{blockId.value}}` (and the shorthand `{{blockId}}`)
//! references with entries from a `FormState`. The grammar is a single
//! regex pass over `{{ ... }}` tokens: no arithmetic, no conditionals, no
//! loops, no nesting, no filters. That restriction is what makes form
//! content safe to author and execute without a sandboxed interpreter, so
//! it must not grow evaluation features.

use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::form::types::FormState;

static TOKEN_RE: OnceLock<Regex> = OnceLock::new();

/// Matches `{{ id }}` and `{{ id.value }}` with optional inner whitespace.
/// Ids are limited to word characters and dashes; anything else is left
/// verbatim rather than evaluated.
fn token_re() -> &'static Regex {
    TOKEN_RE.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z0-9_-]+)(?:\.value)?\s*\}\}")
            .expect("interpolation token pattern is valid")
    })
}

/// Resolve all field references in a template against the given state.
///
/// A reference to a block id absent from the state resolves to the empty
/// string; interpolation never fails the surrounding operation.
pub fn interpolate(template: &str, state: &FormState) -> String {
    token_re()
        .replace_all(template, |caps: &Captures<'_>| {
            state.get(&caps[1]).cloned().unwrap_or_default()
        })
        .into_owned()
}
