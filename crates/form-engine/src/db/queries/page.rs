//! Page database queries.

use uuid::Uuid;

use crate::db::models::Page;
use crate::db::DbPool;
use crate::error::AppResult;

/// Insert a new page. When no position is given the page appends at the end
/// of the workspace. A duplicate title within the workspace violates the
/// unique constraint and surfaces as a conflict.
pub async fn insert_page(
    pool: &DbPool,
    library_id: Uuid,
    workspace_id: Uuid,
    title: &str,
    content: &str,
    position: Option<i32>,
) -> AppResult<Page> {
    let page = sqlx::query_as::<_, Page>(
        r#"
        INSERT INTO cardbase.page (id, library_id, workspace_id, title, content, position)
        VALUES ($1, $2, $3, $4, $5,
                COALESCE($6, (SELECT COALESCE(MAX(position), -1) + 1
                              FROM cardbase.page
                              WHERE workspace_id = $3)))
        RETURNING id, library_id, workspace_id, title, content, position, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(library_id)
    .bind(workspace_id)
    .bind(title)
    .bind(content)
    .bind(position)
    .fetch_one(pool)
    .await?;

    Ok(page)
}
