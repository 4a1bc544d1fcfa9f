//! Repository for the `custom_field_values` table.

use cfe_core::types::DbId;
use sqlx::PgPool;

use crate::models::field_value::{FieldValueRow, UpsertFieldValue};

const COLUMNS: &str =
    "id, field_definition_id, entity_type, entity_id, value, created_at, updated_at";

/// Provides data-access methods for stored custom field values.
pub struct FieldValueRepo;

impl FieldValueRepo {
    /// Insert or replace the value of one field on one entity.
    pub async fn upsert(
        pool: &PgPool,
        input: &UpsertFieldValue,
    ) -> Result<FieldValueRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO custom_field_values (field_definition_id, entity_type, entity_id, value) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (field_definition_id, entity_type, entity_id) \
             DO UPDATE SET value = EXCLUDED.value, updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FieldValueRow>(&query)
            .bind(input.field_definition_id)
            .bind(&input.entity_type)
            .bind(input.entity_id)
            .bind(&input.value)
            .fetch_one(pool)
            .await
    }

    /// List all stored values for an entity.
    pub async fn list_for_entity(
        pool: &PgPool,
        entity_type: &str,
        entity_id: DbId,
    ) -> Result<Vec<FieldValueRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM custom_field_values \
             WHERE entity_type = $1 AND entity_id = $2 \
             ORDER BY field_definition_id"
        );
        sqlx::query_as::<_, FieldValueRow>(&query)
            .bind(entity_type)
            .bind(entity_id)
            .fetch_all(pool)
            .await
    }
}
