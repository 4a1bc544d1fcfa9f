//! Value hydrator: fetches previously stored values for an entity.
//!
//! Merging into the host's values is done by the session with
//! [`cfe_core::hydration`], so a fetch result can arrive before or after the
//! definitions without affecting the outcome.

use std::sync::Arc;

use cfe_core::collaborator::ValueSource;
use cfe_core::definition::{EntityRef, FieldValue};
use cfe_core::engine_events::EVENT_VALUES_HYDRATION_FAILED;
use cfe_events::EngineEvent;

use crate::diagnostics::Diagnostics;

/// Result of a hydration fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum HydrationOutcome {
    /// No entity was given; fields start at their defaults.
    Skipped,
    Loaded(Vec<FieldValue>),
    /// Fetch failed; fields start at their defaults.
    Failed,
}

pub struct ValueHydrator {
    source: Arc<dyn ValueSource>,
    diagnostics: Diagnostics,
}

impl ValueHydrator {
    pub fn new(source: Arc<dyn ValueSource>, diagnostics: Diagnostics) -> Self {
        Self {
            source,
            diagnostics,
        }
    }

    /// Fetch stored values for `entity`, if one is given.
    ///
    /// Records belonging to a different entity are ignored.
    pub async fn fetch(&self, entity: Option<&EntityRef>) -> HydrationOutcome {
        let Some(entity) = entity else {
            return HydrationOutcome::Skipped;
        };

        match self.source.fetch_field_values(entity).await {
            Ok(records) => HydrationOutcome::Loaded(
                records
                    .into_iter()
                    .filter(|r| {
                        r.entity_type == entity.entity_type && r.entity_id == entity.entity_id
                    })
                    .collect(),
            ),
            Err(e) => {
                tracing::warn!(
                    entity_type = %entity.entity_type,
                    entity_id = entity.entity_id,
                    error = %e,
                    "Failed to fetch stored field values; using defaults",
                );
                self.diagnostics.emit(
                    EngineEvent::new(EVENT_VALUES_HYDRATION_FAILED).with_payload(serde_json::json!({
                        "entity_type": entity.entity_type,
                        "entity_id": entity.entity_id,
                        "error": e.to_string(),
                    })),
                );
                HydrationOutcome::Failed
            }
        }
    }
}
