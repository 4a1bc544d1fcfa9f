//! Advisory checks of field values against their resolved constraints.
//!
//! Nothing here is enforced by the engine. The results are metadata a host
//! may show next to a field or consult in its own submit path.

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constraints::{
    anchored, resolve, FieldConstraints, PatternConstraints, ISO_DATE_FORMAT,
};
use crate::control::{value_as_checked, value_as_number, value_as_selection, value_as_text};
use crate::definition::{visible_definitions, FieldDefinition, FieldType};
use crate::render::current_value;
use crate::types::{DbId, ValueMap};

const EMAIL_FORMAT: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";
const URL_FORMAT: &str = r"^[A-Za-z][A-Za-z0-9+.\-]*://\S+$";

/// A single constraint a field value does not satisfy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field_id: DbId,
    pub rule: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

fn violation(
    def: &FieldDefinition,
    rule: &str,
    message: String,
    value: Option<&Value>,
) -> FieldViolation {
    FieldViolation {
        field_id: def.id,
        rule: rule.to_string(),
        message,
        value: value.cloned(),
    }
}

/// Whether a value counts as filled for required-ness and completeness.
fn is_filled(field_type: FieldType, value: Option<&Value>) -> bool {
    if field_type == FieldType::Checkbox {
        return value_as_checked(value);
    }
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(_) => true,
    }
}

fn pattern_matches(pattern: &str, input: &str) -> bool {
    // Patterns were compiled during resolution; a failure here means no constraint.
    Regex::new(&anchored(pattern))
        .map(|re| re.is_match(input))
        .unwrap_or(true)
}

fn check_format(
    def: &FieldDefinition,
    field_type: FieldType,
    format: Option<&str>,
    constraints: &PatternConstraints,
    value: Option<&Value>,
    out: &mut Vec<FieldViolation>,
) {
    let text = value_as_text(value);
    if format.is_some_and(|f| !pattern_matches(f, &text)) {
        out.push(violation(
            def,
            "format",
            format!("{} is not a valid {}", def.label, field_type.name()),
            value,
        ));
    }
    if let Some(pattern) = constraints
        .pattern
        .as_deref()
        .filter(|p| !pattern_matches(p, &text))
    {
        out.push(violation(
            def,
            "pattern",
            format!("{} must match {pattern}", def.label),
            value,
        ));
    }
}

/// Check one field's value.
pub fn check_field(def: &FieldDefinition, value: Option<&Value>) -> Vec<FieldViolation> {
    let resolved = resolve(def);
    let mut out = Vec::new();

    if !is_filled(resolved.field_type, value) {
        if def.is_required {
            out.push(violation(def, "required", format!("{} is required", def.label), value));
        }
        return out;
    }

    match &resolved.constraints {
        FieldConstraints::Text(c) | FieldConstraints::Textarea(c) => {
            let text = value_as_text(value);
            let len = text.chars().count() as u64;
            if let Some(min) = c.min_length.filter(|min| len < *min) {
                out.push(violation(
                    def,
                    "min_length",
                    format!("{} must be at least {min} characters", def.label),
                    value,
                ));
            }
            if let Some(max) = c.max_length.filter(|max| len > *max) {
                out.push(violation(
                    def,
                    "max_length",
                    format!("{} must be at most {max} characters", def.label),
                    value,
                ));
            }
            if let Some(pattern) = c.pattern.as_deref().filter(|p| !pattern_matches(p, &text)) {
                out.push(violation(
                    def,
                    "pattern",
                    format!("{} must match {pattern}", def.label),
                    value,
                ));
            }
        }
        FieldConstraints::Email(c) => {
            check_format(def, FieldType::Email, Some(EMAIL_FORMAT), c, value, &mut out)
        }
        FieldConstraints::Url(c) => {
            check_format(def, FieldType::Url, Some(URL_FORMAT), c, value, &mut out)
        }
        FieldConstraints::Phone(c) => check_format(def, FieldType::Phone, None, c, value, &mut out),
        FieldConstraints::Number(c) => {
            let Some(n) = value_as_number(value) else {
                let message = format!("{} must be a number", def.label);
                out.push(violation(def, "type", message, value));
                return out;
            };
            if let Some(min) = c.min.filter(|min| n < *min) {
                let message = format!("{} must be at least {min}", def.label);
                out.push(violation(def, "min", message, value));
            }
            if let Some(max) = c.max.filter(|max| n > *max) {
                let message = format!("{} must be at most {max}", def.label);
                out.push(violation(def, "max", message, value));
            }
            if let Some(step) = c.step {
                let steps = (n - c.min.unwrap_or(0.0)) / step;
                if (steps - steps.round()).abs() > 1e-9 {
                    out.push(violation(
                        def,
                        "step",
                        format!("{} must be a multiple of {step}", def.label),
                        value,
                    ));
                }
            }
        }
        FieldConstraints::Date(c) => {
            let text = value_as_text(value);
            let Ok(date) = NaiveDate::parse_from_str(&text, ISO_DATE_FORMAT) else {
                let message = format!("{} must be a YYYY-MM-DD date", def.label);
                out.push(violation(def, "format", message, value));
                return out;
            };
            if let Some(min) = c.min_date.filter(|min| date < *min) {
                let message = format!("{} must be on or after {min}", def.label);
                out.push(violation(def, "min_date", message, value));
            }
            if let Some(max) = c.max_date.filter(|max| date > *max) {
                let message = format!("{} must be on or before {max}", def.label);
                out.push(violation(def, "max_date", message, value));
            }
        }
        FieldConstraints::Select(c) | FieldConstraints::Radio(c) => {
            let text = value_as_text(value);
            if !c.options.is_empty() && !c.options.contains(&text) {
                out.push(violation(
                    def,
                    "option",
                    format!("'{text}' is not an allowed value for {}", def.label),
                    value,
                ));
            }
        }
        FieldConstraints::Multiselect(c) => {
            for item in value_as_selection(value) {
                if !c.options.is_empty() && !c.options.contains(&item) {
                    out.push(violation(
                        def,
                        "option",
                        format!("'{item}' is not an allowed value for {}", def.label),
                        value,
                    ));
                }
            }
        }
        FieldConstraints::Checkbox | FieldConstraints::File(_) => {}
    }

    out
}

/// Check every visible field against the host's values (defaults included).
pub fn check_values(definitions: &[FieldDefinition], values: &ValueMap) -> Vec<FieldViolation> {
    visible_definitions(definitions)
        .into_iter()
        .flat_map(|def| check_field(def, current_value(def, values)))
        .collect()
}

// ---------------------------------------------------------------------------
// Completeness
// ---------------------------------------------------------------------------

/// How many required visible fields hold a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completeness {
    pub total_required: usize,
    pub filled: usize,
    pub missing_field_ids: Vec<DbId>,
    pub percentage: f64,
}

/// Compute completeness of the required visible fields.
pub fn completeness(definitions: &[FieldDefinition], values: &ValueMap) -> Completeness {
    let required: Vec<&FieldDefinition> = visible_definitions(definitions)
        .into_iter()
        .filter(|d| d.is_required)
        .collect();
    let total_required = required.len();

    let mut filled = 0usize;
    let mut missing_field_ids = Vec::new();
    for def in required {
        let field_type = def.kind().unwrap_or(FieldType::Text);
        if is_filled(field_type, current_value(def, values)) {
            filled += 1;
        } else {
            missing_field_ids.push(def.id);
        }
    }

    let percentage = if total_required > 0 {
        (filled as f64 / total_required as f64) * 100.0
    } else {
        100.0
    };

    Completeness {
        total_required,
        filled,
        missing_field_ids,
        percentage,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn def(
        id: DbId,
        field_type: &str,
        required: bool,
        validation: Option<Value>,
    ) -> FieldDefinition {
        FieldDefinition {
            id,
            section: "onboarding".into(),
            label: format!("Field {id}"),
            description: None,
            placeholder: None,
            field_type: field_type.into(),
            is_required: required,
            is_active: true,
            display_order: id as i32,
            default_value: None,
            validation,
        }
    }

    fn rules(violations: &[FieldViolation]) -> Vec<&str> {
        violations.iter().map(|v| v.rule.as_str()).collect()
    }

    #[test]
    fn required_empty_value_is_flagged() {
        let d = def(1, "text", true, None);
        assert_eq!(rules(&check_field(&d, None)), vec!["required"]);
        assert_eq!(rules(&check_field(&d, Some(&json!("  ")))), vec!["required"]);
        assert!(check_field(&d, Some(&json!("ok"))).is_empty());
    }

    #[test]
    fn optional_empty_value_passes() {
        let d = def(1, "number", false, Some(json!({"min": 3})));
        assert!(check_field(&d, None).is_empty());
    }

    #[test]
    fn text_length_and_pattern() {
        let validation = json!({"minLength": 3, "maxLength": 5, "pattern": "[a-z]+"});
        let d = def(1, "text", false, Some(validation));
        assert_eq!(rules(&check_field(&d, Some(&json!("ab")))), vec!["min_length"]);
        assert_eq!(rules(&check_field(&d, Some(&json!("abcdef")))), vec!["max_length"]);
        assert_eq!(rules(&check_field(&d, Some(&json!("AB1")))), vec!["pattern"]);
        assert!(check_field(&d, Some(&json!("abcd"))).is_empty());
    }

    #[test]
    fn number_bounds_and_step() {
        let d = def(1, "number", false, Some(json!({"min": 0, "max": 10, "step": 2})));
        assert_eq!(rules(&check_field(&d, Some(&json!(-2)))), vec!["min"]);
        assert_eq!(rules(&check_field(&d, Some(&json!(12)))), vec!["max"]);
        assert_eq!(rules(&check_field(&d, Some(&json!(3)))), vec!["step"]);
        assert_eq!(rules(&check_field(&d, Some(&json!("many")))), vec!["type"]);
        assert!(check_field(&d, Some(&json!(4))).is_empty());
    }

    #[test]
    fn phone_uses_default_pattern() {
        let d = def(1, "phone", false, None);
        assert!(check_field(&d, Some(&json!("5551234567"))).is_empty());
        assert_eq!(rules(&check_field(&d, Some(&json!("555-1234")))), vec!["pattern"]);
    }

    #[test]
    fn email_and_url_formats() {
        let email = def(1, "email", false, None);
        assert!(check_field(&email, Some(&json!("ops@example.com"))).is_empty());
        assert_eq!(rules(&check_field(&email, Some(&json!("ops")))), vec!["format"]);

        let url = def(2, "url", false, None);
        assert!(check_field(&url, Some(&json!("https://example.com/a"))).is_empty());
        assert_eq!(rules(&check_field(&url, Some(&json!("example")))), vec!["format"]);
    }

    #[test]
    fn date_bounds() {
        let validation = json!({"min_date": "2024-01-01", "max_date": "2024-12-31"});
        let d = def(1, "date", false, Some(validation));
        assert!(check_field(&d, Some(&json!("2024-06-01"))).is_empty());
        assert_eq!(rules(&check_field(&d, Some(&json!("2023-12-31")))), vec!["min_date"]);
        assert_eq!(rules(&check_field(&d, Some(&json!("2025-01-01")))), vec!["max_date"]);
        assert_eq!(rules(&check_field(&d, Some(&json!("01/02/2024")))), vec!["format"]);
    }

    #[test]
    fn option_membership() {
        let select = def(1, "select", false, Some(json!({"options": ["A", "B"]})));
        assert!(check_field(&select, Some(&json!("B"))).is_empty());
        assert_eq!(rules(&check_field(&select, Some(&json!("C")))), vec!["option"]);

        let multi = def(2, "multiselect", false, Some(json!({"options": ["A", "B"]})));
        assert_eq!(
            rules(&check_field(&multi, Some(&json!(["A", "Z", "Y"])))),
            vec!["option", "option"]
        );
    }

    #[test]
    fn required_checkbox_must_be_checked() {
        let d = def(1, "checkbox", true, None);
        assert_eq!(rules(&check_field(&d, Some(&json!(false)))), vec!["required"]);
        assert!(check_field(&d, Some(&json!(true))).is_empty());
    }

    #[test]
    fn malformed_validation_checks_nothing_but_required() {
        let d = def(1, "text", true, Some(json!("{")));
        assert!(check_field(&d, Some(&json!("anything at all"))).is_empty());
    }

    #[test]
    fn check_values_skips_inactive_and_uses_defaults() {
        let mut inactive = def(1, "text", true, None);
        inactive.is_active = false;
        let mut defaulted = def(2, "number", true, Some(json!({"max": 1})));
        defaulted.default_value = Some(json!(5));
        let violations = check_values(&[inactive, defaulted], &ValueMap::new());
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field_id, 2);
        assert_eq!(violations[0].rule, "max");
    }

    #[test]
    fn completeness_counts_required_fields() {
        let defs = vec![
            def(1, "text", true, None),
            def(2, "text", true, None),
            def(3, "text", false, None),
        ];
        let values = ValueMap::from([(1, json!("filled"))]);
        let result = completeness(&defs, &values);
        assert_eq!(result.total_required, 2);
        assert_eq!(result.filled, 1);
        assert_eq!(result.missing_field_ids, vec![2]);
        assert!((result.percentage - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn completeness_with_no_required_fields_is_full() {
        let result = completeness(&[def(1, "text", false, None)], &ValueMap::new());
        assert!((result.percentage - 100.0).abs() < f64::EPSILON);
    }
}
