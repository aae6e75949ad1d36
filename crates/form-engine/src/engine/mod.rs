//! Form runtime engine.
//!
//! - **Store**: per-instance effective state with debounced persistence
//! - **Debounce**: the quiet-period sink the store flushes through
//! - **Executor**: button-triggered operations against workspace collaborators

pub mod debounce;
pub mod executor;
pub mod store;

pub use debounce::{PgStateSink, StateSink, DEBOUNCE_DELAY};
pub use executor::{ActionExecutor, CreatePage, ExecutionOutcome, PageCreator};
pub use store::{merge_state, FormStateStore};
