//! Page database model.
//!
//! Pages are the content cards a workspace holds; the form engine only ever
//! creates them (via button actions) and hands the id back to the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Content page within a workspace. Titles are unique per workspace.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Page {
    pub id: Uuid,
    pub library_id: Uuid,
    pub workspace_id: Uuid,
    pub title: String,
    pub content: String,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}
