//! Cardbase Form Engine Library
//!
//! This crate provides the form engine server for Cardbase, handling:
//!
//! - **DSL Parsing & Validation**: Turn YAML-shaped form descriptions into
//!   typed block trees or structured per-block errors
//! - **Form State**: Derive defaults, merge persisted values, and apply
//!   field edits with debounced persistence
//! - **Template Interpolation**: Resolve `{{blockId.value}}` references
//!   through a restricted substitution grammar
//! - **Action Execution**: Dispatch button-triggered operations (page
//!   generation) to workspace collaborators
//!
//! ## Architecture
//!
//! The raw DSL text on a form instance is the source of truth; parsed
//! definitions are derived on demand through a content-hash cache. Each
//! instance's field state lives in memory while edited and flushes through
//! a per-instance debounce timer, so rapid edits coalesce into a single
//! write. Failures are local to one instance and never disturb sibling
//! workspace content.
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading from environment variables
//! - [`db`]: Database connectivity, models, and queries
//! - [`engine`]: State store, debounced persistence, action executor
//! - [`error`]: Custom error types with Axum integration
//! - [`form`]: DSL types, parser/validator, defaults, definition cache
//! - [`handlers`]: HTTP route handlers
//! - [`services`]: Business logic over the database and the engine
//! - [`state`]: Shared application state
//! - [`template`]: Restricted template interpolation

pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod form;
pub mod handlers;
pub mod result_ext;
pub mod services;
pub mod state;
pub mod template;

pub use error::{AppError, AppResult};
pub use result_ext::ResultExt;
