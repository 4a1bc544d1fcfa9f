//! In-memory collaborators shared by the engine integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use cfe_core::collaborator::{
    ChangeNotifier, CollaboratorError, DefinitionSource, FileUploader, UploadFile, UploadedFile,
    ValueSource,
};
use cfe_core::definition::{EntityRef, FieldDefinition, FieldValue};
use cfe_core::types::DbId;
use cfe_engine::{Collaborators, EngineConfig, FieldSession};
use cfe_events::{EngineEvent, EventBus};
use serde_json::Value;
use tokio::sync::{broadcast, oneshot};

pub const SECTION: &str = "vendor_profile";

/// Build a definition in [`SECTION`] with sensible defaults.
pub fn def(id: DbId, field_type: &str, display_order: i32) -> FieldDefinition {
    FieldDefinition {
        id,
        section: SECTION.to_string(),
        label: format!("Field {id}"),
        description: None,
        placeholder: None,
        field_type: field_type.to_string(),
        is_required: false,
        is_active: true,
        display_order,
        default_value: None,
        validation: None,
    }
}

pub fn stored(field_id: DbId, entity: &EntityRef, value: Value) -> FieldValue {
    FieldValue {
        field_definition_id: field_id,
        entity_type: entity.entity_type.clone(),
        entity_id: entity.entity_id,
        value,
    }
}

// ---------------------------------------------------------------------------
// Definition source
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct StaticDefinitions {
    by_section: Mutex<HashMap<String, Vec<FieldDefinition>>>,
    failing: Mutex<bool>,
    calls: Mutex<Vec<String>>,
}

impl StaticDefinitions {
    pub fn new(definitions: Vec<FieldDefinition>) -> Self {
        let source = Self::default();
        for def in definitions {
            source
                .by_section
                .lock()
                .unwrap()
                .entry(def.section.clone())
                .or_default()
                .push(def);
        }
        source
    }

    pub fn failing() -> Self {
        let source = Self::default();
        *source.failing.lock().unwrap() = true;
        source
    }

    pub fn replace(&self, section: &str, definitions: Vec<FieldDefinition>) {
        self.by_section
            .lock()
            .unwrap()
            .insert(section.to_string(), definitions);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DefinitionSource for StaticDefinitions {
    async fn fetch_field_definitions(
        &self,
        section: &str,
    ) -> Result<Vec<FieldDefinition>, CollaboratorError> {
        self.calls.lock().unwrap().push(section.to_string());
        if *self.failing.lock().unwrap() {
            return Err(CollaboratorError::Server {
                status: 500,
                message: "definitions unavailable".into(),
            });
        }
        Ok(self
            .by_section
            .lock()
            .unwrap()
            .get(section)
            .cloned()
            .unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// Value source
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct StaticValues {
    records: Vec<FieldValue>,
    failing: bool,
    calls: Mutex<usize>,
}

impl StaticValues {
    pub fn new(records: Vec<FieldValue>) -> Self {
        Self {
            records,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl ValueSource for StaticValues {
    async fn fetch_field_values(
        &self,
        entity: &EntityRef,
    ) -> Result<Vec<FieldValue>, CollaboratorError> {
        *self.calls.lock().unwrap() += 1;
        if self.failing {
            return Err(CollaboratorError::Transport("connection reset".into()));
        }
        Ok(self
            .records
            .iter()
            .filter(|r| r.entity_type == entity.entity_type && r.entity_id == entity.entity_id)
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Uploader
// ---------------------------------------------------------------------------

type Reply = Result<UploadedFile, CollaboratorError>;

/// Uploader whose calls block until the test resolves them.
///
/// Each call registers a pending reply keyed by field and file name, so a
/// test can settle concurrent uploads on one field in any order.
#[derive(Default)]
pub struct ControlledUploader {
    pending: Mutex<HashMap<(DbId, String), VecDeque<oneshot::Sender<Reply>>>>,
    received: Mutex<Vec<(DbId, String, usize)>>,
    arrived: tokio::sync::Notify,
}

impl ControlledUploader {
    /// Wait until `count` uploads have reached the uploader.
    pub async fn wait_for_calls(&self, count: usize) {
        loop {
            let notified = self.arrived.notified();
            if self.received.lock().unwrap().len() >= count {
                return;
            }
            notified.await;
        }
    }

    /// Resolve the oldest pending upload of `file_name` on `field_id`.
    pub fn resolve(&self, field_id: DbId, file_name: &str, reply: Reply) {
        let sender = self
            .pending
            .lock()
            .unwrap()
            .get_mut(&(field_id, file_name.to_string()))
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| panic!("no pending upload of {file_name} for field {field_id}"));
        let _ = sender.send(reply);
    }

    pub fn succeed(&self, field_id: DbId, file_name: &str, url: &str) {
        let reply = Ok(UploadedFile { url: url.to_string() });
        self.resolve(field_id, file_name, reply);
    }

    pub fn fail(&self, field_id: DbId, file_name: &str) {
        self.resolve(
            field_id,
            file_name,
            Err(CollaboratorError::Server {
                status: 413,
                message: "payload too large".into(),
            }),
        );
    }

    pub fn pending(&self) -> usize {
        self.pending.lock().unwrap().values().map(VecDeque::len).sum()
    }

    pub fn received(&self) -> Vec<(DbId, String, usize)> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl FileUploader for ControlledUploader {
    async fn upload_file(&self, field_id: DbId, file: UploadFile) -> Reply {
        let (tx, rx) = oneshot::channel();
        self.pending
            .lock()
            .unwrap()
            .entry((field_id, file.name.clone()))
            .or_default()
            .push_back(tx);
        self.received
            .lock()
            .unwrap()
            .push((field_id, file.name.clone(), file.bytes.len()));
        self.arrived.notify_waiters();
        rx.await
            .unwrap_or_else(|_| Err(CollaboratorError::Transport("test dropped reply".into())))
    }
}

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

/// Records every change reported to the host.
#[derive(Default)]
pub struct RecordingNotifier {
    changes: Mutex<Vec<(DbId, Value)>>,
}

impl RecordingNotifier {
    pub fn changes(&self) -> Vec<(DbId, Value)> {
        self.changes.lock().unwrap().clone()
    }

    pub fn changes_for(&self, field_id: DbId) -> Vec<Value> {
        self.changes()
            .into_iter()
            .filter(|(id, _)| *id == field_id)
            .map(|(_, v)| v)
            .collect()
    }
}

impl ChangeNotifier for RecordingNotifier {
    fn on_field_change(&self, field_id: DbId, value: Value) {
        self.changes.lock().unwrap().push((field_id, value));
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub definitions: Arc<StaticDefinitions>,
    pub values: Arc<StaticValues>,
    pub uploader: Arc<ControlledUploader>,
    pub notifier: Arc<RecordingNotifier>,
    pub bus: Arc<EventBus>,
    pub session: FieldSession,
}

impl Harness {
    pub fn new(definitions: StaticDefinitions, values: StaticValues) -> Self {
        Self::with_config(definitions, values, EngineConfig::default())
    }

    pub fn with_config(
        definitions: StaticDefinitions,
        values: StaticValues,
        config: EngineConfig,
    ) -> Self {
        let definitions = Arc::new(definitions);
        let values = Arc::new(values);
        let uploader = Arc::new(ControlledUploader::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let bus = Arc::new(EventBus::new(config.event_capacity));

        let collaborators = Collaborators {
            definitions: definitions.clone(),
            values: values.clone(),
            uploader: uploader.clone(),
            notifier: notifier.clone(),
        };
        let session = FieldSession::with_bus(collaborators, &config, Arc::clone(&bus));

        Self {
            definitions,
            values,
            uploader,
            notifier,
            bus,
            session,
        }
    }
}

/// Drain every event currently buffered on `rx`.
pub fn drain(rx: &mut broadcast::Receiver<EngineEvent>) -> Vec<EngineEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub fn event_types(events: &[EngineEvent]) -> Vec<&str> {
    events.iter().map(|e| e.event_type.as_str()).collect()
}
