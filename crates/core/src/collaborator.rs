//! Contracts for the collaborators the engine delegates to.
//!
//! The engine owns no transport and no persistence. Definitions and values
//! are fetched through [`DefinitionSource`] and [`ValueSource`], files go
//! through [`FileUploader`], and every value change is reported to the host
//! through [`ChangeNotifier`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::definition::{EntityRef, FieldDefinition, FieldValue};
use crate::types::DbId;
use crate::upload::LocalFile;

/// Failure reported by a collaborator.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CollaboratorError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Retrieves field definitions for a section.
///
/// Ordering of the returned definitions is not significant.
#[async_trait]
pub trait DefinitionSource: Send + Sync {
    async fn fetch_field_definitions(
        &self,
        section: &str,
    ) -> Result<Vec<FieldDefinition>, CollaboratorError>;
}

/// Retrieves persisted values for an entity.
#[async_trait]
pub trait ValueSource: Send + Sync {
    async fn fetch_field_values(
        &self,
        entity: &EntityRef,
    ) -> Result<Vec<FieldValue>, CollaboratorError>;
}

/// A locally selected file, bytes included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, content_type: Option<&str>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.map(String::from),
            bytes,
        }
    }

    /// Metadata tracked in the upload state while the bytes are in flight.
    pub fn describe(&self) -> LocalFile {
        LocalFile {
            name: self.name.clone(),
            content_type: self.content_type.clone(),
            size: self.bytes.len() as u64,
        }
    }
}

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    /// Stored-location reference committed as the field value.
    pub url: String,
}

/// Stores file bytes and returns a reference to them.
#[async_trait]
pub trait FileUploader: Send + Sync {
    async fn upload_file(
        &self,
        field_id: DbId,
        file: UploadFile,
    ) -> Result<UploadedFile, CollaboratorError>;
}

/// Host callback receiving every field value change.
pub trait ChangeNotifier: Send + Sync {
    fn on_field_change(&self, field_id: DbId, value: Value);
}

impl<F> ChangeNotifier for F
where
    F: Fn(DbId, Value) + Send + Sync,
{
    fn on_field_change(&self, field_id: DbId, value: Value) {
        self(field_id, value)
    }
}
