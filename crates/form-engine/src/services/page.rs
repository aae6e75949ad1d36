//! Page creation service.
//!
//! The collaborator the action executor dispatches `create_card` operations
//! to. Backed by PostgreSQL; a duplicate title within a workspace surfaces
//! as a conflict through the unique constraint.

use async_trait::async_trait;
use uuid::Uuid;

use crate::db::{queries, DbPool};
use crate::engine::executor::{CreatePage, PageCreator};
use crate::error::AppResult;

/// Service for page operations.
#[derive(Clone)]
pub struct PageService {
    pool: DbPool,
}

impl PageService {
    /// Create a new page service.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PageCreator for PageService {
    async fn create_page(&self, request: CreatePage) -> AppResult<Uuid> {
        let page = queries::page::insert_page(
            &self.pool,
            request.library_id,
            request.workspace_id,
            &request.title,
            &request.content,
            request.position,
        )
        .await?;

        tracing::info!(
            page_id = %page.id,
            workspace_id = %request.workspace_id,
            title = %page.title,
            "Page created"
        );

        Ok(page.id)
    }
}
