//! Edit coercion: turns a user interaction on a field into the value that is
//! reported to the host.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::control::{value_as_selection, value_as_checked};
use crate::definition::FieldType;
use crate::error::CoreError;

/// A user interaction on a non-file field.
///
/// File fields change through the upload coordinator instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "input", rename_all = "snake_case")]
pub enum FieldEdit {
    /// Raw input for text-like, number, date, select, and radio fields.
    Input(String),
    /// Add or remove one option of a multiselect.
    ToggleOption(String),
    /// Set a checkbox.
    SetChecked(bool),
    /// Flip a checkbox relative to its current value.
    ToggleChecked,
}

impl FieldEdit {
    fn name(&self) -> &'static str {
        match self {
            Self::Input(_) => "input",
            Self::ToggleOption(_) => "toggle_option",
            Self::SetChecked(_) => "set_checked",
            Self::ToggleChecked => "toggle_checked",
        }
    }
}

/// Compute the new value for a field of `field_type` after `edit`.
///
/// `current` is the value currently bound to the field (host value or
/// default). Returns a validation error when the edit does not apply to the
/// field type.
pub fn apply_edit(
    field_type: FieldType,
    current: Option<&Value>,
    edit: FieldEdit,
) -> Result<Value, CoreError> {
    match (field_type, edit) {
        (
            FieldType::Text
            | FieldType::Textarea
            | FieldType::Email
            | FieldType::Url
            | FieldType::Phone
            | FieldType::Date
            | FieldType::Select
            | FieldType::Radio,
            FieldEdit::Input(input),
        ) => Ok(Value::String(input)),
        (FieldType::Number, FieldEdit::Input(input)) => Ok(coerce_number(&input)),
        (FieldType::Multiselect, FieldEdit::ToggleOption(option)) => Ok(Value::Array(
            toggle_option(&value_as_selection(current), &option)
                .into_iter()
                .map(Value::String)
                .collect(),
        )),
        (FieldType::Checkbox, FieldEdit::SetChecked(checked)) => Ok(Value::Bool(checked)),
        (FieldType::Checkbox, FieldEdit::ToggleChecked) => {
            Ok(Value::Bool(!value_as_checked(current)))
        }
        (FieldType::File, edit) => Err(CoreError::Validation(format!(
            "File fields change through uploads, not '{}' edits",
            edit.name()
        ))),
        (ty, edit) => Err(CoreError::Validation(format!(
            "Edit '{}' does not apply to '{}' fields",
            edit.name(),
            ty.name()
        ))),
    }
}

/// Coerce raw number input into a JSON number.
///
/// Uses the longest numeric prefix of the trimmed input, so `"12kg"` is 12.
/// The prefix is found in a single pass. Input with no numeric prefix, or
/// whose prefix overflows to infinity, commits `0`.
pub fn coerce_number(input: &str) -> Value {
    let n = numeric_prefix(input.trim()).unwrap_or(0.0);
    number_value(n)
}

fn numeric_prefix(input: &str) -> Option<f64> {
    let end = numeric_prefix_len(input.as_bytes());
    if end == 0 {
        return None;
    }
    input[..end].parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Byte length of the longest prefix of the form
/// `[+-]digits[.digits][(e|E)[+-]digits]` with at least one mantissa digit.
fn numeric_prefix_len(bytes: &[u8]) -> usize {
    let digits_from = |start: usize| {
        bytes[start..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };

    let mut i = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }
    let int_digits = digits_from(i);
    i += int_digits;

    let mut frac_digits = 0;
    if bytes.get(i) == Some(&b'.') {
        frac_digits = digits_from(i + 1);
        if int_digits > 0 || frac_digits > 0 {
            i += 1 + frac_digits;
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return 0;
    }

    if matches!(bytes.get(i), Some(b'e' | b'E')) {
        let mut j = i + 1;
        if matches!(bytes.get(j), Some(b'+' | b'-')) {
            j += 1;
        }
        let exp_digits = digits_from(j);
        if exp_digits > 0 {
            i = j + exp_digits;
        }
    }
    i
}

/// Integral values serialize as JSON integers, others as floats.
pub fn number_value(n: f64) -> Value {
    const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;
    if !n.is_finite() {
        return Value::from(0);
    }
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        return Value::from(n as i64);
    }
    serde_json::Number::from_f64(n)
        .map(Value::Number)
        .unwrap_or_else(|| Value::from(0))
}

/// Toggle `option` in a multiselect selection.
///
/// Removing keeps the relative order of the remaining selections; adding
/// appends.
pub fn toggle_option(selection: &[String], option: &str) -> Vec<String> {
    match selection.iter().position(|s| s == option) {
        Some(index) => {
            let mut next = selection.to_vec();
            next.remove(index);
            next
        }
        None => {
            let mut next = selection.to_vec();
            next.push(option.to_string());
            next
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
