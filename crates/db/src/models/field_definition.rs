//! Models for the `custom_field_definitions` table.

use cfe_core::definition::FieldDefinition;
use cfe_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `custom_field_definitions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FieldDefinitionRow {
    pub id: DbId,
    pub section: String,
    pub label: String,
    pub description: Option<String>,
    pub placeholder: Option<String>,
    pub field_type: String,
    pub is_required: bool,
    pub is_active: bool,
    pub display_order: i32,
    pub default_value: Option<serde_json::Value>,
    pub validation: Option<serde_json::Value>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<FieldDefinitionRow> for FieldDefinition {
    fn from(row: FieldDefinitionRow) -> Self {
        FieldDefinition {
            id: row.id,
            section: row.section,
            label: row.label,
            description: row.description,
            placeholder: row.placeholder,
            field_type: row.field_type,
            is_required: row.is_required,
            is_active: row.is_active,
            display_order: row.display_order,
            default_value: row.default_value,
            validation: row.validation,
        }
    }
}

/// DTO for creating a field definition.
///
/// `field_type` is stored as given; unknown types render as text.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateFieldDefinition {
    #[validate(length(min = 1, max = 100))]
    pub section: String,
    #[validate(length(min = 1, max = 255))]
    pub label: String,
    pub description: Option<String>,
    pub placeholder: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub field_type: String,
    pub is_required: Option<bool>,
    pub is_active: Option<bool>,
    pub display_order: Option<i32>,
    pub default_value: Option<serde_json::Value>,
    pub validation: Option<serde_json::Value>,
}
