pub mod field_definition;
pub mod field_value;
