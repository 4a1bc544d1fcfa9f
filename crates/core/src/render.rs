//! Field renderer: maps `(definition, current value, upload state)` to a
//! [`RenderedField`].
//!
//! Rendering is pure and never fails. Definitions with malformed validation
//! metadata or an unknown type still render, and the problem is reported as
//! a [`RenderWarning`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constraints::{resolve, ConstraintError, FieldConstraints};
use crate::control::{
    build_choices, value_as_checked, value_as_choice, value_as_number, value_as_selection,
    value_as_text, FieldControl,
};
use crate::definition::{visible_definitions, FieldDefinition, FieldType};
use crate::types::{DbId, ValueMap};
use crate::upload::{UploadArena, UploadState};

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// One field as it should be presented.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedField {
    pub id: DbId,
    pub label: String,
    pub description: Option<String>,
    pub placeholder: Option<String>,
    /// Visual flag only; the engine does not block on it.
    pub is_required: bool,
    pub display_order: i32,
    /// Effective type after fallback.
    pub field_type: FieldType,
    pub control: FieldControl,
}

/// A non-fatal problem encountered while rendering one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderWarning {
    /// Some or all validation metadata was discarded.
    MalformedValidation { field_id: DbId, reason: String },
    /// The stored type name is unknown; rendered as plain text.
    UnrecognizedFieldType { field_id: DbId, field_type: String },
}

impl RenderWarning {
    pub fn field_id(&self) -> DbId {
        match self {
            Self::MalformedValidation { field_id, .. }
            | Self::UnrecognizedFieldType { field_id, .. } => *field_id,
        }
    }
}

/// Availability of the definition set behind a view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    #[default]
    Pending,
    Ready,
    /// Definitions could not be fetched; the view is empty.
    Failed,
}

/// The rendered field set for a section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSetView {
    pub status: LoadStatus,
    pub fields: Vec<RenderedField>,
    pub warnings: Vec<RenderWarning>,
}

impl FieldSetView {
    /// A view with no fields, used while pending or after a failed load.
    pub fn empty(status: LoadStatus) -> Self {
        Self {
            status,
            fields: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn field(&self, id: DbId) -> Option<&RenderedField> {
        self.fields.iter().find(|f| f.id == id)
    }

    pub fn field_ids(&self) -> Vec<DbId> {
        self.fields.iter().map(|f| f.id).collect()
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// The value bound to a field: the host's value if present and non-null,
/// otherwise the definition's default.
pub fn current_value<'a>(def: &'a FieldDefinition, values: &'a ValueMap) -> Option<&'a Value> {
    values
        .get(&def.id)
        .filter(|v| !v.is_null())
        .or(def.default_value.as_ref())
}

/// Render one definition.
pub fn render_field(
    def: &FieldDefinition,
    value: Option<&Value>,
    upload: &UploadState,
) -> (RenderedField, Vec<RenderWarning>) {
    let resolved = resolve(def);

    let mut warnings: Vec<RenderWarning> = Vec::new();
    if !resolved.recognized {
        warnings.push(RenderWarning::UnrecognizedFieldType {
            field_id: def.id,
            field_type: def.field_type.clone(),
        });
    }
    warnings.extend(
        resolved
            .issues
            .iter()
            .map(|issue: &ConstraintError| RenderWarning::MalformedValidation {
                field_id: def.id,
                reason: issue.to_string(),
            }),
    );

    let control = build_control(resolved.constraints, value, upload);

    let field = RenderedField {
        id: def.id,
        label: def.label.clone(),
        description: def.description.clone(),
        placeholder: def.placeholder.clone(),
        is_required: def.is_required,
        display_order: def.display_order,
        field_type: resolved.field_type,
        control,
    };
    (field, warnings)
}

fn build_control(
    constraints: FieldConstraints,
    value: Option<&Value>,
    upload: &UploadState,
) -> FieldControl {
    match constraints {
        FieldConstraints::Text(constraints) => FieldControl::Text {
            value: value_as_text(value),
            constraints,
        },
        FieldConstraints::Textarea(constraints) => FieldControl::Textarea {
            value: value_as_text(value),
            constraints,
        },
        FieldConstraints::Number(constraints) => FieldControl::Number {
            value: value_as_number(value),
            constraints,
        },
        FieldConstraints::Email(constraints) => FieldControl::Email {
            value: value_as_text(value),
            constraints,
        },
        FieldConstraints::Url(constraints) => FieldControl::Url {
            value: value_as_text(value),
            constraints,
        },
        FieldConstraints::Phone(constraints) => FieldControl::Phone {
            value: value_as_text(value),
            constraints,
        },
        FieldConstraints::Date(constraints) => FieldControl::Date {
            value: value_as_text(value),
            constraints,
        },
        FieldConstraints::Select(opts) => {
            let selected = value_as_choice(value);
            let choices = build_choices(&opts.options, |o| selected.as_deref() == Some(o));
            FieldControl::Select { selected, choices }
        }
        FieldConstraints::Radio(opts) => {
            let selected = value_as_choice(value);
            let choices = build_choices(&opts.options, |o| selected.as_deref() == Some(o));
            FieldControl::Radio { selected, choices }
        }
        FieldConstraints::Multiselect(opts) => {
            let selected = value_as_selection(value);
            let choices = build_choices(&opts.options, |o| selected.iter().any(|s| s == o));
            FieldControl::Multiselect { selected, choices }
        }
        FieldConstraints::Checkbox => FieldControl::Checkbox {
            checked: value_as_checked(value),
        },
        FieldConstraints::File(constraints) => FieldControl::File {
            url: value_as_choice(value),
            upload: upload.clone(),
            constraints,
        },
    }
}

/// Render the visible field set: active definitions only, ordered by
/// `(display_order, id)`, each bound to its current value.
pub fn render_field_set(
    definitions: &[FieldDefinition],
    values: &ValueMap,
    uploads: &UploadArena,
) -> FieldSetView {
    let visible = visible_definitions(definitions);
    let mut fields = Vec::with_capacity(visible.len());
    let mut warnings = Vec::new();

    for def in visible {
        let upload = uploads.get(def.id);
        let (field, field_warnings) = render_field(def, current_value(def, values), &upload);
        fields.push(field);
        warnings.extend(field_warnings);
    }

    FieldSetView {
        status: LoadStatus::Ready,
        fields,
        warnings,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
