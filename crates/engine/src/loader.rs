//! Definition loader: fetches and caches the active definitions of a section.

use std::collections::HashMap;
use std::sync::Arc;

use cfe_core::collaborator::DefinitionSource;
use cfe_core::definition::{into_visible_definitions, FieldDefinition};
use cfe_core::engine_events::{EVENT_DEFINITIONS_LOADED, EVENT_DEFINITIONS_LOAD_FAILED};
use cfe_core::render::LoadStatus;
use cfe_events::EngineEvent;
use tokio::sync::RwLock;

use crate::diagnostics::Diagnostics;

/// Load state of a section's definitions.
#[derive(Debug, Clone, Default)]
pub enum DefinitionsState {
    #[default]
    Pending,
    /// Active definitions for the section, ordered by `(display_order, id)`.
    Loaded(Arc<Vec<FieldDefinition>>),
    /// Fetch failed; the section is treated as having no custom fields.
    Failed,
}

impl DefinitionsState {
    pub fn status(&self) -> LoadStatus {
        match self {
            Self::Pending => LoadStatus::Pending,
            Self::Loaded(_) => LoadStatus::Ready,
            Self::Failed => LoadStatus::Failed,
        }
    }

    /// The loaded definitions; empty unless loaded.
    pub fn definitions(&self) -> &[FieldDefinition] {
        match self {
            Self::Loaded(defs) => defs.as_slice(),
            Self::Pending | Self::Failed => &[],
        }
    }
}

/// Fetches definitions through a [`DefinitionSource`] with a per-section
/// cache. Failed fetches are not cached.
pub struct DefinitionLoader {
    source: Arc<dyn DefinitionSource>,
    cache: RwLock<HashMap<String, Arc<Vec<FieldDefinition>>>>,
    cache_enabled: bool,
    diagnostics: Diagnostics,
}

impl DefinitionLoader {
    pub fn new(
        source: Arc<dyn DefinitionSource>,
        cache_enabled: bool,
        diagnostics: Diagnostics,
    ) -> Self {
        Self {
            source,
            cache: RwLock::new(HashMap::new()),
            cache_enabled,
            diagnostics,
        }
    }

    /// Load the active definitions of `section`.
    pub async fn load(&self, section: &str) -> DefinitionsState {
        if self.cache_enabled {
            if let Some(defs) = self.cache.read().await.get(section) {
                tracing::debug!(section, count = defs.len(), "Definition cache hit");
                return DefinitionsState::Loaded(Arc::clone(defs));
            }
        }

        match self.source.fetch_field_definitions(section).await {
            Ok(fetched) => {
                let fetched_count = fetched.len();
                let scoped: Vec<FieldDefinition> =
                    fetched.into_iter().filter(|d| d.section == section).collect();
                let defs = Arc::new(into_visible_definitions(scoped));

                tracing::debug!(
                    section,
                    fetched = fetched_count,
                    visible = defs.len(),
                    "Loaded field definitions",
                );
                self.diagnostics.emit(
                    EngineEvent::new(EVENT_DEFINITIONS_LOADED)
                        .with_section(section)
                        .with_payload(serde_json::json!({
                            "fetched": fetched_count,
                            "visible": defs.len(),
                        })),
                );

                if self.cache_enabled {
                    self.cache
                        .write()
                        .await
                        .insert(section.to_string(), Arc::clone(&defs));
                }
                DefinitionsState::Loaded(defs)
            }
            Err(e) => {
                tracing::warn!(
                    section,
                    error = %e,
                    "Failed to fetch field definitions; rendering without custom fields",
                );
                self.diagnostics.emit(
                    EngineEvent::new(EVENT_DEFINITIONS_LOAD_FAILED)
                        .with_section(section)
                        .with_payload(serde_json::json!({ "error": e.to_string() })),
                );
                DefinitionsState::Failed
            }
        }
    }

    /// Drop the cached definitions of one section.
    pub async fn invalidate(&self, section: &str) {
        self.cache.write().await.remove(section);
    }
}
