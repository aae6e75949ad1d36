//! Workspace database queries.

use uuid::Uuid;

use crate::db::models::Workspace;
use crate::db::DbPool;
use crate::error::AppResult;

/// Get a workspace by id.
pub async fn get_workspace(pool: &DbPool, workspace_id: Uuid) -> AppResult<Option<Workspace>> {
    let workspace = sqlx::query_as::<_, Workspace>(
        r#"
        SELECT id, library_id, name, created_at
        FROM cardbase.workspace
        WHERE id = $1
        "#,
    )
    .bind(workspace_id)
    .fetch_optional(pool)
    .await?;

    Ok(workspace)
}
