//! Repository for the `custom_field_definitions` table.

use cfe_core::types::DbId;
use sqlx::PgPool;

use crate::models::field_definition::{CreateFieldDefinition, FieldDefinitionRow};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, section, label, description, placeholder, field_type, \
    is_required, is_active, display_order, default_value, validation, created_at, updated_at";

/// Provides data-access methods for custom field definitions.
pub struct FieldDefinitionRepo;

impl FieldDefinitionRepo {
    /// Insert a new definition, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateFieldDefinition,
    ) -> Result<FieldDefinitionRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO custom_field_definitions \
                (section, label, description, placeholder, field_type, is_required, \
                 is_active, display_order, default_value, validation) \
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, false), COALESCE($7, true), \
                     COALESCE($8, 0), $9, $10) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FieldDefinitionRow>(&query)
            .bind(&input.section)
            .bind(&input.label)
            .bind(&input.description)
            .bind(&input.placeholder)
            .bind(&input.field_type)
            .bind(input.is_required)
            .bind(input.is_active)
            .bind(input.display_order)
            .bind(&input.default_value)
            .bind(&input.validation)
            .fetch_one(pool)
            .await
    }

    /// Find a definition by its internal ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<FieldDefinitionRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM custom_field_definitions WHERE id = $1");
        sqlx::query_as::<_, FieldDefinitionRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List every definition of a section, inactive ones included.
    pub async fn list_by_section(
        pool: &PgPool,
        section: &str,
    ) -> Result<Vec<FieldDefinitionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM custom_field_definitions \
             WHERE section = $1 \
             ORDER BY display_order, id"
        );
        sqlx::query_as::<_, FieldDefinitionRow>(&query)
            .bind(section)
            .fetch_all(pool)
            .await
    }

    /// List the active definitions of a section in display order.
    pub async fn list_active_by_section(
        pool: &PgPool,
        section: &str,
    ) -> Result<Vec<FieldDefinitionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM custom_field_definitions \
             WHERE section = $1 AND is_active = true \
             ORDER BY display_order, id"
        );
        sqlx::query_as::<_, FieldDefinitionRow>(&query)
            .bind(section)
            .fetch_all(pool)
            .await
    }

    /// Activate or deactivate a definition. Returns `true` if a row changed.
    pub async fn set_active(pool: &PgPool, id: DbId, is_active: bool) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE custom_field_definitions SET is_active = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(is_active)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
