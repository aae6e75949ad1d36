//! Form instance database queries.

use uuid::Uuid;

use crate::db::models::FormInstance;
use crate::db::DbPool;
use crate::error::AppResult;

/// Insert a new empty form instance. When no position is given the instance
/// appends at the end of the workspace.
pub async fn insert_form(
    pool: &DbPool,
    workspace_id: Uuid,
    position: Option<i32>,
) -> AppResult<FormInstance> {
    let instance = sqlx::query_as::<_, FormInstance>(
        r#"
        INSERT INTO cardbase.form_instance (id, workspace_id, content, form_data, position)
        VALUES ($1, $2, '', '{}'::jsonb,
                COALESCE($3, (SELECT COALESCE(MAX(position), -1) + 1
                              FROM cardbase.form_instance
                              WHERE workspace_id = $2)))
        RETURNING id, workspace_id, content, form_data, is_collapsed, is_in_ai_context,
                  position, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(workspace_id)
    .bind(position)
    .fetch_one(pool)
    .await?;

    Ok(instance)
}

/// Get a form instance by id.
pub async fn get_form(pool: &DbPool, form_id: Uuid) -> AppResult<Option<FormInstance>> {
    let instance = sqlx::query_as::<_, FormInstance>(
        r#"
        SELECT id, workspace_id, content, form_data, is_collapsed, is_in_ai_context,
               position, created_at, updated_at
        FROM cardbase.form_instance
        WHERE id = $1
        "#,
    )
    .bind(form_id)
    .fetch_optional(pool)
    .await?;

    Ok(instance)
}

/// List a workspace's form instances in position order.
pub async fn list_forms_by_workspace(
    pool: &DbPool,
    workspace_id: Uuid,
) -> AppResult<Vec<FormInstance>> {
    let instances = sqlx::query_as::<_, FormInstance>(
        r#"
        SELECT id, workspace_id, content, form_data, is_collapsed, is_in_ai_context,
               position, created_at, updated_at
        FROM cardbase.form_instance
        WHERE workspace_id = $1
        ORDER BY position, created_at
        "#,
    )
    .bind(workspace_id)
    .fetch_all(pool)
    .await?;

    Ok(instances)
}

/// Partially update a form instance. Each nullable bind leaves its column
/// unchanged, so `content` and `form_data` update independently.
pub async fn update_form(
    pool: &DbPool,
    form_id: Uuid,
    content: Option<&str>,
    form_data: Option<&serde_json::Value>,
    is_collapsed: Option<bool>,
    is_in_ai_context: Option<bool>,
    position: Option<i32>,
) -> AppResult<Option<FormInstance>> {
    let instance = sqlx::query_as::<_, FormInstance>(
        r#"
        UPDATE cardbase.form_instance
        SET content = COALESCE($2, content),
            form_data = COALESCE($3, form_data),
            is_collapsed = COALESCE($4, is_collapsed),
            is_in_ai_context = COALESCE($5, is_in_ai_context),
            position = COALESCE($6, position),
            updated_at = now()
        WHERE id = $1
        RETURNING id, workspace_id, content, form_data, is_collapsed, is_in_ai_context,
                  position, created_at, updated_at
        "#,
    )
    .bind(form_id)
    .bind(content)
    .bind(form_data)
    .bind(is_collapsed)
    .bind(is_in_ai_context)
    .bind(position)
    .fetch_optional(pool)
    .await?;

    Ok(instance)
}

/// Overwrite the persisted field state. Used by the debounced flush; the
/// snapshot is always the full latest state, so a plain overwrite is
/// correct (last-write-wins).
pub async fn update_form_data(
    pool: &DbPool,
    form_id: Uuid,
    form_data: &serde_json::Value,
) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE cardbase.form_instance
        SET form_data = $2,
            updated_at = now()
        WHERE id = $1
        "#,
    )
    .bind(form_id)
    .bind(form_data)
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete a form instance. Returns whether a row was removed.
pub async fn delete_form(pool: &DbPool, form_id: Uuid) -> AppResult<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM cardbase.form_instance
        WHERE id = $1
        "#,
    )
    .bind(form_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
