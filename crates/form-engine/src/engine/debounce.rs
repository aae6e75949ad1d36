//! Debounced persistence sink.
//!
//! Field edits flush through a `StateSink` after a fixed quiet period; the
//! store (see `engine::store`) owns the cancel-and-reschedule timers and
//! calls the sink with the latest full snapshot when a timer fires.

use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::db::{queries, DbPool};
use crate::error::AppResult;
use crate::form::types::FormState;

/// Quiet period between the last edit and the persistence write.
pub const DEBOUNCE_DELAY: Duration = Duration::from_millis(1000);

/// Destination for debounced state writes.
///
/// The store only ever hands a sink the latest full state snapshot, so a
/// sink implementation can treat every call as a complete replacement
/// (last-write-wins).
#[async_trait]
pub trait StateSink: Send + Sync {
    async fn flush(&self, form_id: Uuid, state: FormState) -> AppResult<()>;
}

/// PostgreSQL-backed sink writing `form_data` on the instance row.
pub struct PgStateSink {
    pool: DbPool,
}

impl PgStateSink {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StateSink for PgStateSink {
    async fn flush(&self, form_id: Uuid, state: FormState) -> AppResult<()> {
        let data = serde_json::to_value(&state)?;
        queries::form::update_form_data(&self.pool, form_id, &data).await?;
        tracing::debug!(form_id = %form_id, fields = state.len(), "Flushed form state");
        Ok(())
    }
}
