//! Workspace database model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Workspace within a library. The engine reads it to resolve the library
/// a generated page belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Workspace {
    pub id: Uuid,
    pub library_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}
