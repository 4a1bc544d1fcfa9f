//! A field session binds one section (and optionally one entity) to the
//! host's value map.
//!
//! The session is a controlled component: it never stores committed values.
//! Every change goes to the host through the [`ChangeNotifier`], and the host
//! passes its value map back into [`FieldSession::render`].

use std::sync::Arc;

use cfe_core::advisory::{check_values, completeness, Completeness, FieldViolation};
use cfe_core::collaborator::{
    ChangeNotifier, DefinitionSource, FileUploader, UploadFile, ValueSource,
};
use cfe_core::definition::{EntityRef, FieldDefinition, FieldType};
use cfe_core::edit::{apply_edit, FieldEdit};
use cfe_core::engine_events::{EVENT_FIELD_RENDER_DEGRADED, EVENT_VALUES_HYDRATED};
use cfe_core::error::CoreError;
use cfe_core::hydration::{apply_seed, plan_seed};
use cfe_core::render::{current_value, render_field_set, FieldSetView, RenderWarning};
use cfe_core::types::{DbId, ValueMap};
use cfe_core::upload::UploadState;
use cfe_events::{EngineEvent, EventBus};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::EngineConfig;
use crate::coordinator::{UploadCoordinator, UploadOutcome};
use crate::diagnostics::Diagnostics;
use crate::hydrator::{HydrationOutcome, ValueHydrator};
use crate::loader::{DefinitionLoader, DefinitionsState};

/// The host-supplied collaborators a session delegates to.
#[derive(Clone)]
pub struct Collaborators {
    pub definitions: Arc<dyn DefinitionSource>,
    pub values: Arc<dyn ValueSource>,
    pub uploader: Arc<dyn FileUploader>,
    pub notifier: Arc<dyn ChangeNotifier>,
}

/// Hydration progress for the session's entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HydrationStatus {
    #[default]
    Pending,
    /// No entity was given.
    Skipped,
    /// Stored values were fetched; `seeded` of them were reported to the host.
    Hydrated { seeded: usize },
    /// The fetch failed; fields started at their defaults.
    Failed,
}

pub struct FieldSession {
    loader: DefinitionLoader,
    hydrator: ValueHydrator,
    uploads: UploadCoordinator,
    notifier: Arc<dyn ChangeNotifier>,
    diagnostics: Diagnostics,
    bus: Option<Arc<EventBus>>,
    section: Option<String>,
    entity: Option<EntityRef>,
    definitions: DefinitionsState,
    hydration: HydrationStatus,
}

impl FieldSession {
    /// Create a session with its own diagnostic bus.
    pub fn new(collaborators: Collaborators, config: &EngineConfig) -> Self {
        let bus = Arc::new(EventBus::new(config.event_capacity));
        Self::with_bus(collaborators, config, bus)
    }

    /// Create a session publishing diagnostics on a shared bus.
    pub fn with_bus(
        collaborators: Collaborators,
        config: &EngineConfig,
        bus: Arc<EventBus>,
    ) -> Self {
        Self::build(collaborators, config, Some(bus))
    }

    /// Create a session that only logs, without publishing events.
    pub fn without_events(collaborators: Collaborators, config: &EngineConfig) -> Self {
        Self::build(collaborators, config, None)
    }

    fn build(
        collaborators: Collaborators,
        config: &EngineConfig,
        bus: Option<Arc<EventBus>>,
    ) -> Self {
        let diagnostics = match &bus {
            Some(bus) => Diagnostics::new(Arc::clone(bus)),
            None => Diagnostics::disabled(),
        };
        Self {
            loader: DefinitionLoader::new(
                collaborators.definitions,
                config.cache_definitions,
                diagnostics.clone(),
            ),
            hydrator: ValueHydrator::new(collaborators.values, diagnostics.clone()),
            uploads: UploadCoordinator::new(
                collaborators.uploader,
                Arc::clone(&collaborators.notifier),
                config.stale_uploads,
                diagnostics.clone(),
            ),
            notifier: collaborators.notifier,
            diagnostics,
            bus,
            section: None,
            entity: None,
            definitions: DefinitionsState::Pending,
            hydration: HydrationStatus::Pending,
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Load the section's definitions and hydrate the entity's stored values
    /// concurrently, then render.
    ///
    /// Stored values are seeded only into fields the host has no value for,
    /// and each seed is reported through the notifier. An entity is hydrated
    /// once per session; a failed hydration is retried on the next open.
    pub async fn open(
        &mut self,
        section: &str,
        entity: Option<EntityRef>,
        values: &ValueMap,
    ) -> FieldSetView {
        if self.section.as_deref() != Some(section) {
            self.loader.invalidate(section).await;
        }

        let entity_changed = self.entity != entity;
        let needs_hydration = entity_changed
            || matches!(self.hydration, HydrationStatus::Pending | HydrationStatus::Failed);
        let hydrator = &self.hydrator;
        let hydrate = async {
            if needs_hydration {
                Some(hydrator.fetch(entity.as_ref()).await)
            } else {
                None
            }
        };

        let (definitions, hydrated) = tokio::join!(self.loader.load(section), hydrate);

        self.section = Some(section.to_string());
        self.definitions = definitions;
        self.entity = entity;

        let mut merged = values.clone();
        if let Some(outcome) = hydrated {
            self.hydration = self.seed(outcome, &mut merged);
        }

        tracing::info!(
            section,
            status = ?self.definitions.status(),
            hydration = ?self.hydration,
            "Field session opened",
        );

        let view = self.render(&merged).await;
        self.report_warnings(section, &view.warnings);
        view
    }

    /// Switch to another section, refetching its definitions.
    pub async fn set_section(&mut self, section: &str, values: &ValueMap) -> FieldSetView {
        self.loader.invalidate(section).await;
        self.definitions = self.loader.load(section).await;
        self.section = Some(section.to_string());

        let view = self.render(values).await;
        self.report_warnings(section, &view.warnings);
        view
    }

    /// Drop cached definitions and reload the current section.
    pub async fn refresh(&mut self, values: &ValueMap) -> FieldSetView {
        match self.section.clone() {
            Some(section) => self.set_section(&section, values).await,
            None => self.render(values).await,
        }
    }

    fn seed(&self, outcome: HydrationOutcome, values: &mut ValueMap) -> HydrationStatus {
        let records = match outcome {
            HydrationOutcome::Skipped => return HydrationStatus::Skipped,
            HydrationOutcome::Failed => return HydrationStatus::Failed,
            HydrationOutcome::Loaded(records) => records,
        };

        let seeds = plan_seed(values, &records);
        let written = apply_seed(values, &seeds);
        for (field_id, value) in &seeds {
            tracing::debug!(field_id, "Seeding stored field value");
            self.notifier.on_field_change(*field_id, value.clone());
        }

        self.diagnostics.emit(
            EngineEvent::new(EVENT_VALUES_HYDRATED).with_payload(json!({
                "stored": records.len(),
                "seeded": written,
            })),
        );
        HydrationStatus::Hydrated {
            seeded: written.len(),
        }
    }

    fn report_warnings(&self, section: &str, warnings: &[RenderWarning]) {
        for warning in warnings {
            tracing::warn!(
                section,
                field_id = warning.field_id(),
                warning = ?warning,
                "Field rendered degraded"
            );
            self.diagnostics.emit(
                EngineEvent::new(EVENT_FIELD_RENDER_DEGRADED)
                    .with_section(section)
                    .with_field(warning.field_id())
                    .with_payload(serde_json::to_value(warning).unwrap_or(Value::Null)),
            );
        }
    }

    // -----------------------------------------------------------------------
    // Rendering and edits
    // -----------------------------------------------------------------------

    /// Render the current section against the host's values.
    pub async fn render(&self, values: &ValueMap) -> FieldSetView {
        match &self.definitions {
            DefinitionsState::Loaded(defs) => {
                let uploads = self.uploads.snapshot().await;
                render_field_set(defs, values, &uploads)
            }
            DefinitionsState::Pending | DefinitionsState::Failed => {
                FieldSetView::empty(self.definitions.status())
            }
        }
    }

    fn definition(&self, field_id: DbId) -> Result<&FieldDefinition, CoreError> {
        self.definitions
            .definitions()
            .iter()
            .find(|d| d.id == field_id)
            .ok_or(CoreError::NotFound {
                entity: "field_definition",
                id: field_id,
            })
    }

    fn file_definition(&self, field_id: DbId) -> Result<&FieldDefinition, CoreError> {
        let def = self.definition(field_id)?;
        match def.kind() {
            Some(FieldType::File) => Ok(def),
            _ => Err(CoreError::Validation(format!(
                "Field {field_id} is a '{}' field, not a file field",
                def.field_type
            ))),
        }
    }

    /// Apply a user edit to a non-file field and report the new value.
    ///
    /// Returns the value sent to the notifier.
    pub fn edit(
        &self,
        field_id: DbId,
        edit: FieldEdit,
        values: &ValueMap,
    ) -> Result<Value, CoreError> {
        let def = self.definition(field_id)?;
        let field_type = def.kind().unwrap_or(FieldType::Text);
        let value = apply_edit(field_type, current_value(def, values), edit)?;
        self.notifier.on_field_change(field_id, value.clone());
        Ok(value)
    }

    /// Start uploading a file for a file field.
    pub async fn select_file(
        &self,
        field_id: DbId,
        file: UploadFile,
    ) -> Result<JoinHandle<UploadOutcome>, CoreError> {
        self.file_definition(field_id)?;
        Ok(self.uploads.select_file(field_id, file).await)
    }

    /// Clear a file field, reporting an empty value.
    pub async fn clear_file(&self, field_id: DbId) -> Result<UploadState, CoreError> {
        self.file_definition(field_id)?;
        Ok(self.uploads.clear(field_id).await)
    }

    pub async fn upload_state(&self, field_id: DbId) -> UploadState {
        self.uploads.state(field_id).await
    }

    /// Number of fields with an upload currently tracked as in flight.
    pub async fn uploads_in_flight(&self) -> usize {
        self.uploads.in_flight().await
    }

    // -----------------------------------------------------------------------
    // Advisory
    // -----------------------------------------------------------------------

    pub fn violations(&self, values: &ValueMap) -> Vec<FieldViolation> {
        check_values(self.definitions.definitions(), values)
    }

    pub fn completeness(&self, values: &ValueMap) -> Completeness {
        completeness(self.definitions.definitions(), values)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn section(&self) -> Option<&str> {
        self.section.as_deref()
    }

    pub fn entity(&self) -> Option<&EntityRef> {
        self.entity.as_ref()
    }

    pub fn definitions(&self) -> &DefinitionsState {
        &self.definitions
    }

    pub fn hydration_status(&self) -> HydrationStatus {
        self.hydration
    }

    /// Subscribe to diagnostic events, if the session publishes them.
    pub fn subscribe(&self) -> Option<broadcast::Receiver<EngineEvent>> {
        self.bus.as_ref().map(|bus| bus.subscribe())
    }
}
