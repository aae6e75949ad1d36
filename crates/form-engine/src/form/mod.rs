//! Form DSL: types, parser/validator, default state, and definition cache.
//!
//! The raw DSL text is authoritative; everything here is derived from it.

pub mod cache;
pub mod defaults;
pub mod parser;
pub mod types;

pub use cache::{CachedForm, DefinitionCache};
pub use defaults::build_default_state;
pub use parser::parse_form;
pub use types::{
    Block, BlockRef, FormDefinition, FormError, FormState, Operation, ParsedForm, ValidationError,
};
