//! One-time seeding of host values from persisted field values.
//!
//! A stored value is only seeded when the host has no value for that field.
//! Values the user already edited are never overwritten.

use std::collections::HashSet;

use serde_json::Value;

use crate::definition::FieldValue;
use crate::types::{DbId, ValueMap};

/// Whether the host already holds a value for `field_id`.
///
/// JSON `null` counts as no value.
pub fn has_value(values: &ValueMap, field_id: DbId) -> bool {
    values.get(&field_id).is_some_and(|v| !v.is_null())
}

/// Compute which stored values should be seeded into `values`.
///
/// When the store returns several records for one field, the first wins.
pub fn plan_seed(values: &ValueMap, stored: &[FieldValue]) -> Vec<(DbId, Value)> {
    let mut seen = HashSet::new();
    stored
        .iter()
        .filter(|record| seen.insert(record.field_definition_id))
        .filter(|record| !has_value(values, record.field_definition_id))
        .map(|record| (record.field_definition_id, record.value.clone()))
        .collect()
}

/// Apply a seed plan to a value map, re-checking presence.
///
/// Returns the ids actually written.
pub fn apply_seed(values: &mut ValueMap, seeds: &[(DbId, Value)]) -> Vec<DbId> {
    let mut written = Vec::new();
    for (field_id, value) in seeds {
        if !has_value(values, *field_id) {
            values.insert(*field_id, value.clone());
            written.push(*field_id);
        }
    }
    written
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
