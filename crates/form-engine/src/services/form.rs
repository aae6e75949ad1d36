//! Form instance service.
//!
//! Owns the lifecycle of form instances: validation, creation, updates,
//! field edits through the debounced state store, execution of button
//! actions, and deletion. The raw DSL text on the row is authoritative;
//! parsed definitions are derived through a content-hash cache so field
//! edits never re-parse.

use std::sync::Arc;

use uuid::Uuid;

use crate::db::models::{CreateFormRequest, FormInstance, FormResponse, UpdateFormRequest};
use crate::db::{queries, DbPool};
use crate::engine::debounce::{PgStateSink, DEBOUNCE_DELAY};
use crate::engine::executor::{ActionExecutor, ExecutionOutcome};
use crate::engine::store::{merge_state, FormStateStore};
use crate::error::{AppError, AppResult};
use crate::form::cache::{CachedForm, DefinitionCache};
use crate::form::defaults::build_default_state;
use crate::form::parser::parse_form;
use crate::form::types::{FormError, FormState, ParsedForm};
use crate::services::page::PageService;

/// Parsed definitions kept per distinct content hash.
const DEFINITION_CACHE_CAPACITY: usize = 256;

/// Service for form instance operations.
#[derive(Clone)]
pub struct FormService {
    pool: DbPool,
    cache: Arc<DefinitionCache>,
    store: Arc<FormStateStore>,
    executor: Arc<ActionExecutor>,
}

impl FormService {
    /// Create a new form service wired to PostgreSQL-backed collaborators.
    pub fn new(pool: DbPool) -> Self {
        let sink = Arc::new(PgStateSink::new(pool.clone()));
        let pages = Arc::new(PageService::new(pool.clone()));
        Self {
            pool,
            cache: Arc::new(DefinitionCache::new(DEFINITION_CACHE_CAPACITY)),
            store: Arc::new(FormStateStore::new(sink, DEBOUNCE_DELAY)),
            executor: Arc::new(ActionExecutor::new(pages)),
        }
    }

    /// Validate raw content without touching any instance.
    pub fn validate(&self, content: &str) -> AppResult<ParsedForm> {
        Ok(parse_form(content)?)
    }

    /// Attach a new empty instance to a workspace.
    pub async fn create_form(
        &self,
        workspace_id: Uuid,
        request: CreateFormRequest,
    ) -> AppResult<FormResponse> {
        queries::workspace::get_workspace(&self.pool, workspace_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Workspace '{}' not found", workspace_id)))?;

        let instance = queries::form::insert_form(&self.pool, workspace_id, request.position).await?;
        tracing::info!(form_id = %instance.id, workspace_id = %workspace_id, "Form instance created");

        self.respond(instance).await
    }

    /// Get an instance with its parse outcome and effective state.
    pub async fn get_form(&self, form_id: Uuid) -> AppResult<FormResponse> {
        let instance = self.require_form(form_id).await?;
        self.respond(instance).await
    }

    /// List a workspace's instances.
    pub async fn list_forms(&self, workspace_id: Uuid) -> AppResult<Vec<FormResponse>> {
        let instances = queries::form::list_forms_by_workspace(&self.pool, workspace_id).await?;
        let mut responses = Vec::with_capacity(instances.len());
        for instance in instances {
            responses.push(self.respond(instance).await?);
        }
        Ok(responses)
    }

    /// Partially update an instance. `content` and `form_data` update
    /// independently; when either changes, the live state re-derives from
    /// the updated row so the definition stays authoritative for shape.
    pub async fn update_form(
        &self,
        form_id: Uuid,
        request: UpdateFormRequest,
    ) -> AppResult<FormResponse> {
        let form_data = match &request.form_data {
            Some(state) => Some(serde_json::to_value(state)?),
            None => None,
        };

        let instance = queries::form::update_form(
            &self.pool,
            form_id,
            request.content.as_deref(),
            form_data.as_ref(),
            request.is_collapsed,
            request.is_in_ai_context,
            request.position,
        )
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Form '{}' not found", form_id)))?;

        if request.content.is_some() || request.form_data.is_some() {
            // Drop live state (and any pending flush of it) so the response
            // below reseeds from the freshly persisted row.
            self.store.remove(form_id).await;
        }

        self.respond(instance).await
    }

    /// Apply a single field edit through the debounced store and return the
    /// effective state.
    pub async fn apply_edit(
        &self,
        form_id: Uuid,
        block_id: &str,
        value: &str,
    ) -> AppResult<FormState> {
        let instance = self.require_form(form_id).await?;

        let definition = match self.cache.parse(&instance.content)? {
            CachedForm::Form(def) => def,
            CachedForm::Empty => {
                return Err(AppError::BadRequest(
                    "Form has no content; nothing to edit".to_string(),
                ))
            }
        };

        let block = definition.get_block(block_id).ok_or_else(|| {
            AppError::NotFound(format!("Block '{}' not found in form", block_id))
        })?;
        if !block.is_stateful() {
            return Err(AppError::BadRequest(format!(
                "Block '{}' is a {} block and holds no value",
                block_id,
                block.type_name()
            )));
        }

        if self.store.get(form_id).await.is_none() {
            let defaults = build_default_state(&definition);
            let effective = merge_state(&instance.persisted_state(), &defaults);
            self.store.load(form_id, effective).await;
        }

        Ok(self.store.apply_edit(form_id, block_id, value).await)
    }

    /// Execute the button behind `block_id` with the caller's current state.
    ///
    /// Invalid DSL blocks execution until the content is corrected; a
    /// failed execution leaves both the DSL and the field state untouched,
    /// so retrying is always safe.
    pub async fn execute(
        &self,
        form_id: Uuid,
        workspace_id: Uuid,
        block_id: &str,
        form_state: &FormState,
    ) -> AppResult<ExecutionOutcome> {
        let instance = self.require_form(form_id).await?;
        if instance.workspace_id != workspace_id {
            return Err(AppError::BadRequest(format!(
                "Form '{}' does not belong to workspace '{}'",
                form_id, workspace_id
            )));
        }

        let definition = match self.cache.parse(&instance.content)? {
            CachedForm::Form(def) => def,
            CachedForm::Empty => {
                return Err(AppError::BadRequest(
                    "Form has no content; nothing to execute".to_string(),
                ))
            }
        };

        let workspace = queries::workspace::get_workspace(&self.pool, instance.workspace_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Workspace '{}' not found", instance.workspace_id))
            })?;

        // The caller's snapshot merged over defaults: junk keys drop out,
        // unset fields resolve to their defaults.
        let defaults = build_default_state(&definition);
        let effective = merge_state(form_state, &defaults);

        self.executor
            .execute(
                &definition,
                workspace.library_id,
                workspace.id,
                block_id,
                &effective,
            )
            .await
    }

    /// Destroy an instance, cancelling any pending state flush.
    pub async fn delete_form(&self, form_id: Uuid) -> AppResult<()> {
        self.store.remove(form_id).await;
        let deleted = queries::form::delete_form(&self.pool, form_id).await?;
        if !deleted {
            return Err(AppError::NotFound(format!("Form '{}' not found", form_id)));
        }
        tracing::info!(form_id = %form_id, "Form instance deleted");
        Ok(())
    }

    async fn require_form(&self, form_id: Uuid) -> AppResult<FormInstance> {
        queries::form::get_form(&self.pool, form_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Form '{}' not found", form_id)))
    }

    /// Build the API view of an instance: parse outcome plus effective
    /// state. Invalid content still returns the editable raw DSL with the
    /// error details; it never fails the request.
    async fn respond(&self, instance: FormInstance) -> AppResult<FormResponse> {
        match self.cache.parse(&instance.content) {
            Ok(CachedForm::Empty) => Ok(FormResponse::new(instance, "empty", FormState::new())),
            Ok(CachedForm::Form(definition)) => {
                let defaults = build_default_state(&definition);
                let base = match self.store.get(instance.id).await {
                    Some(live) if !live.is_empty() => live,
                    _ => instance.persisted_state(),
                };
                let effective = merge_state(&base, &defaults);
                self.store.load(instance.id, effective.clone()).await;

                Ok(FormResponse::new(instance, "valid", effective)
                    .with_definition((*definition).clone()))
            }
            Err(FormError::Invalid(errors)) => {
                Ok(FormResponse::new(instance, "invalid", FormState::new()).with_errors(errors))
            }
            Err(FormError::Malformed(message)) => {
                Ok(FormResponse::new(instance, "invalid", FormState::new())
                    .with_parse_error(message))
            }
        }
    }
}
