//! Concrete input controls produced by the renderer.
//!
//! One variant per field type, each carrying the bound value in its
//! natural shape and the constraint parameters the control should enforce.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constraints::{
    DateConstraints, FileConstraints, NumberConstraints, PatternConstraints, TextConstraints,
};
use crate::upload::UploadState;

/// A single selectable option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    /// Stable render key; empty option strings get a positional key.
    pub key: String,
    pub value: String,
    pub selected: bool,
}

/// Build choices for an option list, flagging the selected ones.
pub fn build_choices(options: &[String], is_selected: impl Fn(&str) -> bool) -> Vec<Choice> {
    options
        .iter()
        .enumerate()
        .map(|(index, option)| Choice {
            key: choice_key(index, option),
            value: option.clone(),
            selected: is_selected(option),
        })
        .collect()
}

/// Render key for the option at `index`.
pub fn choice_key(index: usize, option: &str) -> String {
    if option.is_empty() {
        format!("option-{index}")
    } else {
        option.to_string()
    }
}

/// The input affordance for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "control", rename_all = "snake_case")]
pub enum FieldControl {
    Text {
        value: String,
        constraints: TextConstraints,
    },
    Textarea {
        value: String,
        constraints: TextConstraints,
    },
    Number {
        /// `None` renders an empty input.
        value: Option<f64>,
        constraints: NumberConstraints,
    },
    Email {
        value: String,
        constraints: PatternConstraints,
    },
    Url {
        value: String,
        constraints: PatternConstraints,
    },
    Phone {
        value: String,
        constraints: PatternConstraints,
    },
    Date {
        /// ISO `YYYY-MM-DD`, or empty.
        value: String,
        constraints: DateConstraints,
    },
    Select {
        selected: Option<String>,
        choices: Vec<Choice>,
    },
    Multiselect {
        selected: Vec<String>,
        choices: Vec<Choice>,
    },
    Radio {
        selected: Option<String>,
        choices: Vec<Choice>,
    },
    Checkbox {
        checked: bool,
    },
    File {
        /// Committed file reference, if any.
        url: Option<String>,
        upload: UploadState,
        constraints: FileConstraints,
    },
}

impl FieldControl {
    /// Browser-level input mode hint for string controls.
    pub fn input_mode(&self) -> Option<&'static str> {
        match self {
            Self::Email { .. } => Some("email"),
            Self::Url { .. } => Some("url"),
            Self::Phone { .. } => Some("tel"),
            Self::Number { .. } => Some("decimal"),
            Self::Text { .. }
            | Self::Textarea { .. }
            | Self::Date { .. }
            | Self::Select { .. }
            | Self::Multiselect { .. }
            | Self::Radio { .. }
            | Self::Checkbox { .. }
            | Self::File { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Value shaping
// ---------------------------------------------------------------------------

/// Display string for text-like controls.
pub fn value_as_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect::<Vec<_>>()
            .join(", "),
        Some(other @ Value::Object(_)) => other.to_string(),
    }
}

/// Numeric value for number controls; unparseable values render empty.
pub fn value_as_number(value: Option<&Value>) -> Option<f64> {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|n| n.is_finite())
}

/// Single selection; empty strings count as no selection.
pub fn value_as_choice(value: Option<&Value>) -> Option<String> {
    Some(value_as_text(value)).filter(|s| !s.is_empty())
}

/// Multiselect selection; non-array values select nothing.
pub fn value_as_selection(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect(),
        _ => Vec::new(),
    }
}

/// Checkbox state; absent values are unchecked.
pub fn value_as_checked(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => matches!(s.as_str(), "true" | "on" | "1"),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        None | Some(Value::Null) | Some(Value::Array(_)) | Some(Value::Object(_)) => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
