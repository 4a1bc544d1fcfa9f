//! Models for the `custom_field_values` table.

use cfe_core::definition::FieldValue;
use cfe_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `custom_field_values` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FieldValueRow {
    pub id: DbId,
    pub field_definition_id: DbId,
    pub entity_type: String,
    pub entity_id: DbId,
    pub value: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<FieldValueRow> for FieldValue {
    fn from(row: FieldValueRow) -> Self {
        FieldValue {
            field_definition_id: row.field_definition_id,
            entity_type: row.entity_type,
            entity_id: row.entity_id,
            value: row.value,
        }
    }
}

/// DTO for inserting or replacing the value of one field on one entity.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpsertFieldValue {
    #[validate(range(min = 1))]
    pub field_definition_id: DbId,
    #[validate(length(min = 1, max = 100))]
    pub entity_type: String,
    #[validate(range(min = 1))]
    pub entity_id: DbId,
    pub value: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input() -> UpsertFieldValue {
        UpsertFieldValue {
            field_definition_id: 4,
            entity_type: "vendor".into(),
            entity_id: 12,
            value: json!(["a", "b"]),
        }
    }

    #[test]
    fn valid_input_passes() {
        assert!(input().validate().is_ok());
    }

    #[test]
    fn blank_entity_type_is_rejected() {
        let mut bad = input();
        bad.entity_type = String::new();
        let errors = bad.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("entity_type"));
    }

    #[test]
    fn non_positive_ids_are_rejected() {
        let mut bad = input();
        bad.entity_id = 0;
        bad.field_definition_id = -1;
        let errors = bad.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("entity_id"));
        assert!(fields.contains_key("field_definition_id"));
    }

    #[test]
    fn row_converts_to_engine_value() {
        let now = chrono::Utc::now();
        let row = FieldValueRow {
            id: 1,
            field_definition_id: 4,
            entity_type: "vendor".into(),
            entity_id: 12,
            value: json!("x"),
            created_at: now,
            updated_at: now,
        };
        let value = FieldValue::from(row);
        assert_eq!(value.field_definition_id, 4);
        assert_eq!(value.value, json!("x"));
    }
}
