//! Integration tests for the custom field tables and `PgFieldStore`.
//!
//! Require a Postgres instance via `DATABASE_URL`; run with
//! `cargo test -p cfe-db -- --ignored`.

use assert_matches::assert_matches;
use cfe_core::collaborator::{DefinitionSource, ValueSource};
use cfe_core::definition::EntityRef;
use cfe_db::models::field_definition::CreateFieldDefinition;
use cfe_db::models::field_value::UpsertFieldValue;
use cfe_db::repositories::{FieldDefinitionRepo, FieldValueRepo};
use cfe_db::{PgFieldStore, StoreError};
use serde_json::json;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_definition(
    section: &str,
    label: &str,
    field_type: &str,
    order: i32,
) -> CreateFieldDefinition {
    CreateFieldDefinition {
        section: section.to_string(),
        label: label.to_string(),
        description: None,
        placeholder: None,
        field_type: field_type.to_string(),
        is_required: None,
        is_active: None,
        display_order: Some(order),
        default_value: None,
        validation: None,
    }
}

fn value_for(
    field_definition_id: i64,
    entity_id: i64,
    value: serde_json::Value,
) -> UpsertFieldValue {
    UpsertFieldValue {
        field_definition_id,
        entity_type: "vendor".to_string(),
        entity_id,
        value,
    }
}

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_active_definitions_are_ordered(pool: PgPool) {
    let late = new_definition("vendor_profile", "Late", "text", 2);
    let late = FieldDefinitionRepo::create(&pool, &late).await.unwrap();
    let early = new_definition("vendor_profile", "Early", "checkbox", 1);
    let early = FieldDefinitionRepo::create(&pool, &early).await.unwrap();
    let hidden = new_definition("vendor_profile", "Hidden", "text", 0);
    let hidden = FieldDefinitionRepo::create(&pool, &hidden).await.unwrap();
    FieldDefinitionRepo::create(&pool, &new_definition("contract", "Other", "text", 0))
        .await
        .unwrap();

    assert!(FieldDefinitionRepo::set_active(&pool, hidden.id, false).await.unwrap());

    let active = FieldDefinitionRepo::list_active_by_section(&pool, "vendor_profile")
        .await
        .unwrap();
    let ids: Vec<i64> = active.iter().map(|d| d.id).collect();
    assert_eq!(ids, vec![early.id, late.id]);

    let all = FieldDefinitionRepo::list_by_section(&pool, "vendor_profile")
        .await
        .unwrap();
    assert_eq!(all.len(), 3);

    let found = FieldDefinitionRepo::find_by_id(&pool, early.id).await.unwrap().unwrap();
    assert_eq!(found.field_type, "checkbox");
    assert!(found.is_active);
    assert!(!found.is_required);
}

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_upsert_replaces_existing_value(pool: PgPool) {
    let def = new_definition("vendor_profile", "Tier", "select", 1);
    let def = FieldDefinitionRepo::create(&pool, &def).await.unwrap();

    let first = FieldValueRepo::upsert(&pool, &value_for(def.id, 7, json!("gold")))
        .await
        .unwrap();
    let second = FieldValueRepo::upsert(&pool, &value_for(def.id, 7, json!("silver")))
        .await
        .unwrap();
    assert_eq!(first.id, second.id);

    let rows = FieldValueRepo::list_for_entity(&pool, "vendor", 7).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].value, json!("silver"));

    assert!(FieldValueRepo::list_for_entity(&pool, "vendor", 8).await.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_store_serves_engine_collaborators(pool: PgPool) {
    let def = new_definition("vendor_profile", "Website", "url", 1);
    let def = FieldDefinitionRepo::create(&pool, &def).await.unwrap();
    let store = PgFieldStore::new(pool);

    store
        .save_value(&value_for(def.id, 3, json!("https://acme.example")))
        .await
        .unwrap();

    let defs = store.fetch_field_definitions("vendor_profile").await.unwrap();
    assert_eq!(defs.len(), 1);
    assert_eq!(defs[0].label, "Website");

    let values = store
        .fetch_field_values(&EntityRef::new("vendor", 3))
        .await
        .unwrap();
    assert_eq!(values.len(), 1);
    assert_eq!(values[0].field_definition_id, def.id);
    assert_eq!(values[0].value, json!("https://acme.example"));
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_save_value_rejects_invalid_input(pool: PgPool) {
    let store = PgFieldStore::new(pool);

    let mut blank = value_for(1, 3, json!("x"));
    blank.entity_type = String::new();
    assert_matches!(store.save_value(&blank).await, Err(StoreError::Validation(_)));

    assert_matches!(
        store.save_value(&value_for(999_999, 3, json!("x"))).await,
        Err(StoreError::UnknownField(999_999))
    );
}
