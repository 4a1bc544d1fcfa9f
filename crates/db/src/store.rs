//! Postgres-backed collaborators for the field engine.

use async_trait::async_trait;
use cfe_core::collaborator::{CollaboratorError, DefinitionSource, ValueSource};
use cfe_core::definition::{EntityRef, FieldDefinition, FieldValue};
use cfe_core::types::DbId;
use sqlx::PgPool;
use validator::Validate;

use crate::models::field_value::{FieldValueRow, UpsertFieldValue};
use crate::repositories::{FieldDefinitionRepo, FieldValueRepo};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Unknown field definition: {0}")]
    UnknownField(DbId),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Serves definitions and stored values from Postgres.
#[derive(Clone)]
pub struct PgFieldStore {
    pool: PgPool,
}

impl PgFieldStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Validate and persist one field value for the host's save path.
    pub async fn save_value(&self, input: &UpsertFieldValue) -> Result<FieldValueRow, StoreError> {
        input.validate()?;
        if FieldDefinitionRepo::find_by_id(&self.pool, input.field_definition_id)
            .await?
            .is_none()
        {
            return Err(StoreError::UnknownField(input.field_definition_id));
        }
        Ok(FieldValueRepo::upsert(&self.pool, input).await?)
    }
}

fn storage_error(e: sqlx::Error) -> CollaboratorError {
    CollaboratorError::Storage(e.to_string())
}

#[async_trait]
impl DefinitionSource for PgFieldStore {
    async fn fetch_field_definitions(
        &self,
        section: &str,
    ) -> Result<Vec<FieldDefinition>, CollaboratorError> {
        let rows = FieldDefinitionRepo::list_active_by_section(&self.pool, section)
            .await
            .map_err(|e| {
                tracing::error!(section, error = %e, "Failed to list field definitions");
                storage_error(e)
            })?;
        Ok(rows.into_iter().map(FieldDefinition::from).collect())
    }
}

#[async_trait]
impl ValueSource for PgFieldStore {
    async fn fetch_field_values(
        &self,
        entity: &EntityRef,
    ) -> Result<Vec<FieldValue>, CollaboratorError> {
        let rows =
            FieldValueRepo::list_for_entity(&self.pool, &entity.entity_type, entity.entity_id)
                .await
            .map_err(|e| {
                tracing::error!(
                    entity_type = %entity.entity_type,
                    entity_id = entity.entity_id,
                    error = %e,
                    "Failed to list field values",
                );
                storage_error(e)
            })?;
        Ok(rows.into_iter().map(FieldValue::from).collect())
    }
}
