pub mod field_definition_repo;
pub mod field_value_repo;

pub use field_definition_repo::FieldDefinitionRepo;
pub use field_value_repo::FieldValueRepo;
