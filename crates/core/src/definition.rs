//! Field definitions, stored field values, and the closed set of field types.
//!
//! Definitions are read-only from the engine's point of view: they are
//! authored by an administrative tool and only ever fetched, filtered, and
//! ordered here.

use serde::{Deserialize, Serialize};

use crate::types::DbId;

// ---------------------------------------------------------------------------
// Field type
// ---------------------------------------------------------------------------

/// The declared type of a custom field.
///
/// Matched exhaustively everywhere it is dispatched on, so adding a variant
/// is a compile-time change across the renderer, edit coercion, and advisory
/// checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Textarea,
    Number,
    Email,
    Phone,
    Date,
    Url,
    Select,
    Multiselect,
    Radio,
    Checkbox,
    File,
}

impl FieldType {
    /// Every field type, in declaration order.
    pub const ALL: [FieldType; 12] = [
        Self::Text,
        Self::Textarea,
        Self::Number,
        Self::Email,
        Self::Phone,
        Self::Date,
        Self::Url,
        Self::Select,
        Self::Multiselect,
        Self::Radio,
        Self::Checkbox,
        Self::File,
    ];

    /// Parse from the stored `field_type` name.
    ///
    /// Returns `None` for names this engine does not know.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "text" => Some(Self::Text),
            "textarea" => Some(Self::Textarea),
            "number" => Some(Self::Number),
            "email" => Some(Self::Email),
            "phone" => Some(Self::Phone),
            "date" => Some(Self::Date),
            "url" => Some(Self::Url),
            "select" => Some(Self::Select),
            "multiselect" => Some(Self::Multiselect),
            "radio" => Some(Self::Radio),
            "checkbox" => Some(Self::Checkbox),
            "file" => Some(Self::File),
            _ => None,
        }
    }

    /// The stored name of this type.
    pub fn name(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Textarea => "textarea",
            Self::Number => "number",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Date => "date",
            Self::Url => "url",
            Self::Select => "select",
            Self::Multiselect => "multiselect",
            Self::Radio => "radio",
            Self::Checkbox => "checkbox",
            Self::File => "file",
        }
    }
}

// ---------------------------------------------------------------------------
// Field definition
// ---------------------------------------------------------------------------

/// Definition of a single dynamically-added field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub id: DbId,
    /// Opaque key scoping which screen / entity kind the field belongs to.
    pub section: String,
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub placeholder: Option<String>,
    /// Stored type name. Kept raw so unknown names survive deserialization
    /// and degrade at render time instead.
    pub field_type: String,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default)]
    pub default_value: Option<serde_json::Value>,
    /// Serialized constraint object; either a JSON object or a string
    /// containing one.
    #[serde(default)]
    pub validation: Option<serde_json::Value>,
}

fn default_true() -> bool {
    true
}

impl FieldDefinition {
    /// The parsed field type, or `None` when the stored name is unknown.
    pub fn kind(&self) -> Option<FieldType> {
        FieldType::from_name(&self.field_type)
    }

    /// Ordering key: ascending `display_order`, ties broken by `id`.
    pub fn sort_key(&self) -> (i32, DbId) {
        (self.display_order, self.id)
    }
}

/// Filter out inactive definitions and order the rest deterministically.
pub fn visible_definitions(definitions: &[FieldDefinition]) -> Vec<&FieldDefinition> {
    let mut visible: Vec<&FieldDefinition> = definitions.iter().filter(|d| d.is_active).collect();
    visible.sort_by_key(|d| d.sort_key());
    visible
}

/// Owned variant of [`visible_definitions`], used by the loader when
/// caching a section's definitions.
pub fn into_visible_definitions(definitions: Vec<FieldDefinition>) -> Vec<FieldDefinition> {
    let mut visible: Vec<FieldDefinition> =
        definitions.into_iter().filter(|d| d.is_active).collect();
    visible.sort_by_key(|d| d.sort_key());
    visible
}

// ---------------------------------------------------------------------------
// Field values
// ---------------------------------------------------------------------------

/// The record that owns a set of persisted field values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub entity_type: String,
    pub entity_id: DbId,
}

impl EntityRef {
    pub fn new(entity_type: impl Into<String>, entity_id: DbId) -> Self {
        Self {
            entity_type: entity_type.into(),
            entity_id,
        }
    }
}

/// Persisted value of one field definition for one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldValue {
    pub field_definition_id: DbId,
    pub entity_type: String,
    pub entity_id: DbId,
    /// Scalar, array of strings (multiselect), or an uploaded-file reference.
    pub value: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
