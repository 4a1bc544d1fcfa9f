//! Parsing of the per-field `validation` payload into typed constraints.
//!
//! The payload is stored metadata and may be missing, a JSON object, a
//! string containing JSON, or garbage. Parsing never fails outright: a bad
//! payload degrades to "no constraints" for that field and the problem is
//! reported as a [`ConstraintError`] alongside the result.

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::definition::{FieldDefinition, FieldType};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Pattern applied to phone fields that do not configure their own.
pub const DEFAULT_PHONE_PATTERN: &str = "[0-9]{10}";

/// ISO date format used by date constraints and values.
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A problem found while parsing a validation payload.
///
/// These never abort rendering; they are surfaced as warnings.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConstraintError {
    #[error("validation payload is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("validation payload must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("invalid date bound '{key}': {value}")]
    InvalidDate { key: &'static str, value: String },
}

// ---------------------------------------------------------------------------
// Payload parsing
// ---------------------------------------------------------------------------

/// Decode a raw validation payload into a JSON object.
///
/// `None`, `null`, and blank strings are an empty object.
pub fn parse_payload(raw: Option<&Value>) -> Result<Map<String, Value>, ConstraintError> {
    match raw {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(obj)) => Ok(obj.clone()),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(Map::new()),
        Some(Value::String(s)) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Object(obj)) => Ok(obj),
            Ok(other) => Err(ConstraintError::NotAnObject(json_kind(&other))),
            Err(e) => Err(ConstraintError::InvalidJson(e.to_string())),
        },
        Some(other) => Err(ConstraintError::NotAnObject(json_kind(other))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Look up the first key present, accepting snake_case and camelCase aliases.
fn lookup<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| map.get(*k)).filter(|v| !v.is_null())
}

/// Numbers may be stored as JSON numbers or numeric strings.
fn lenient_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|n| n.is_finite())
}

fn lenient_u64(value: &Value) -> Option<u64> {
    lenient_f64(value).filter(|n| *n >= 0.0).map(|n| n as u64)
}

fn non_empty_str(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Keep a pattern only if it compiles.
fn checked_pattern(map: &Map<String, Value>, issues: &mut Vec<ConstraintError>) -> Option<String> {
    let pattern = lookup(map, &["pattern"]).and_then(non_empty_str)?;
    match Regex::new(&anchored(&pattern)) {
        Ok(_) => Some(pattern),
        Err(e) => {
            issues.push(ConstraintError::InvalidPattern {
                pattern,
                reason: e.to_string(),
            });
            None
        }
    }
}

/// Patterns follow HTML input semantics: they must match the whole value.
pub fn anchored(pattern: &str) -> String {
    format!("^(?:{pattern})$")
}

// ---------------------------------------------------------------------------
// Typed constraint shapes
// ---------------------------------------------------------------------------

/// Constraints for `text` and `textarea` fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextConstraints {
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub pattern: Option<String>,
    /// Visible row count; only meaningful for textarea.
    pub rows: Option<u32>,
}

impl TextConstraints {
    fn from_map(map: &Map<String, Value>, issues: &mut Vec<ConstraintError>) -> Self {
        Self {
            min_length: lookup(map, &["min_length", "minLength"]).and_then(lenient_u64),
            max_length: lookup(map, &["max_length", "maxLength"]).and_then(lenient_u64),
            pattern: checked_pattern(map, issues),
            rows: lookup(map, &["rows"])
                .and_then(lenient_u64)
                .and_then(|r| u32::try_from(r).ok()),
        }
    }
}

/// Constraints for `number` fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NumberConstraints {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub step: Option<f64>,
}

impl NumberConstraints {
    fn from_map(map: &Map<String, Value>) -> Self {
        Self {
            min: lookup(map, &["min"]).and_then(lenient_f64),
            max: lookup(map, &["max"]).and_then(lenient_f64),
            step: lookup(map, &["step"])
                .and_then(lenient_f64)
                .filter(|s| *s > 0.0),
        }
    }
}

/// Constraints for `email`, `url`, and `phone` fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternConstraints {
    pub pattern: Option<String>,
}

impl PatternConstraints {
    fn from_map(map: &Map<String, Value>, issues: &mut Vec<ConstraintError>) -> Self {
        Self {
            pattern: checked_pattern(map, issues),
        }
    }
}

/// Constraints for `date` fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DateConstraints {
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
}

impl DateConstraints {
    fn from_map(map: &Map<String, Value>, issues: &mut Vec<ConstraintError>) -> Self {
        Self {
            min_date: date_bound(map, "min_date", &["min_date", "minDate"], issues),
            max_date: date_bound(map, "max_date", &["max_date", "maxDate"], issues),
        }
    }
}

fn date_bound(
    map: &Map<String, Value>,
    key: &'static str,
    aliases: &[&str],
    issues: &mut Vec<ConstraintError>,
) -> Option<NaiveDate> {
    let raw = lookup(map, aliases).and_then(non_empty_str)?;
    match NaiveDate::parse_from_str(&raw, ISO_DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(_) => {
            issues.push(ConstraintError::InvalidDate { key, value: raw });
            None
        }
    }
}

/// Choices for `select`, `multiselect`, and `radio` fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptionConstraints {
    pub options: Vec<String>,
}

impl OptionConstraints {
    fn from_map(map: &Map<String, Value>) -> Self {
        let options = lookup(map, &["options"])
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| match item {
                        Value::String(s) => Some(s.clone()),
                        Value::Number(n) => Some(n.to_string()),
                        Value::Bool(b) => Some(b.to_string()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self { options }
    }
}

/// Constraints for `file` fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileConstraints {
    /// MIME / extension filter, e.g. `"image/*,.pdf"`.
    pub accept: Option<String>,
}

impl FileConstraints {
    fn from_map(map: &Map<String, Value>) -> Self {
        Self {
            accept: lookup(map, &["accept"]).and_then(non_empty_str),
        }
    }
}

// ---------------------------------------------------------------------------
// Resolution per field type
// ---------------------------------------------------------------------------

/// Constraint shape owned by each field type.
///
/// One variant per [`FieldType`], so the effective type can be read back
/// from the constraints alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldConstraints {
    Text(TextConstraints),
    Textarea(TextConstraints),
    Number(NumberConstraints),
    Email(PatternConstraints),
    Url(PatternConstraints),
    Phone(PatternConstraints),
    Date(DateConstraints),
    Select(OptionConstraints),
    Multiselect(OptionConstraints),
    Radio(OptionConstraints),
    Checkbox,
    File(FileConstraints),
}

impl FieldConstraints {
    pub fn field_type(&self) -> FieldType {
        match self {
            Self::Text(_) => FieldType::Text,
            Self::Textarea(_) => FieldType::Textarea,
            Self::Number(_) => FieldType::Number,
            Self::Email(_) => FieldType::Email,
            Self::Url(_) => FieldType::Url,
            Self::Phone(_) => FieldType::Phone,
            Self::Date(_) => FieldType::Date,
            Self::Select(_) => FieldType::Select,
            Self::Multiselect(_) => FieldType::Multiselect,
            Self::Radio(_) => FieldType::Radio,
            Self::Checkbox => FieldType::Checkbox,
            Self::File(_) => FieldType::File,
        }
    }
}

/// Constraints resolved for one definition, plus any parse problems.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConstraints {
    /// Effective type; unrecognized names resolve to [`FieldType::Text`].
    pub field_type: FieldType,
    /// `false` when the stored type name was unknown.
    pub recognized: bool,
    pub constraints: FieldConstraints,
    pub issues: Vec<ConstraintError>,
}

impl ResolvedConstraints {
    /// True when the payload or one of its entries had to be discarded.
    pub fn is_degraded(&self) -> bool {
        !self.issues.is_empty()
    }
}

/// Resolve the effective type and typed constraints of a definition.
pub fn resolve(def: &FieldDefinition) -> ResolvedConstraints {
    let (field_type, recognized) = match def.kind() {
        Some(ty) => (ty, true),
        None => (FieldType::Text, false),
    };

    let mut issues = Vec::new();
    // Unknown types render as plain text with no constraints.
    let map = if recognized {
        parse_payload(def.validation.as_ref()).unwrap_or_else(|e| {
            issues.push(e);
            Map::new()
        })
    } else {
        Map::new()
    };

    let constraints = match field_type {
        FieldType::Text => FieldConstraints::Text(TextConstraints::from_map(&map, &mut issues)),
        FieldType::Textarea => {
            FieldConstraints::Textarea(TextConstraints::from_map(&map, &mut issues))
        }
        FieldType::Number => FieldConstraints::Number(NumberConstraints::from_map(&map)),
        FieldType::Email => {
            FieldConstraints::Email(PatternConstraints::from_map(&map, &mut issues))
        }
        FieldType::Url => FieldConstraints::Url(PatternConstraints::from_map(&map, &mut issues)),
        FieldType::Phone => {
            let mut pattern = PatternConstraints::from_map(&map, &mut issues);
            if pattern.pattern.is_none() {
                pattern.pattern = Some(DEFAULT_PHONE_PATTERN.to_string());
            }
            FieldConstraints::Phone(pattern)
        }
        FieldType::Date => FieldConstraints::Date(DateConstraints::from_map(&map, &mut issues)),
        FieldType::Select => FieldConstraints::Select(OptionConstraints::from_map(&map)),
        FieldType::Multiselect => FieldConstraints::Multiselect(OptionConstraints::from_map(&map)),
        FieldType::Radio => FieldConstraints::Radio(OptionConstraints::from_map(&map)),
        FieldType::Checkbox => FieldConstraints::Checkbox,
        FieldType::File => FieldConstraints::File(FileConstraints::from_map(&map)),
    };

    ResolvedConstraints {
        field_type,
        recognized,
        constraints,
        issues,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
