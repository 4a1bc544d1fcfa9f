//! Upload coordinator: drives the per-field upload state machine against a
//! [`FileUploader`] and reports committed references to the host.
//!
//! The arena lock is never held across the uploader call, so uploads on
//! different fields proceed independently.

use std::sync::Arc;

use cfe_core::collaborator::{ChangeNotifier, FileUploader, UploadFile};
use cfe_core::engine_events::{
    EVENT_UPLOAD_CLEARED, EVENT_UPLOAD_FAILED, EVENT_UPLOAD_STALE_COMPLETION,
    EVENT_UPLOAD_STARTED, EVENT_UPLOAD_SUCCEEDED,
};
use cfe_core::types::DbId;
use cfe_core::upload::{Completion, UploadArena, UploadState, UploadTicket};
use cfe_events::EngineEvent;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::config::StaleUploadPolicy;
use crate::diagnostics::Diagnostics;

/// How an upload attempt ended, from the coordinator's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UploadOutcome {
    /// The reference was recorded and reported to the host.
    Succeeded { url: String },
    /// The attempt failed; the field is back to idle and nothing was reported.
    Failed,
    /// The attempt was superseded or cleared before it resolved.
    /// `delivered` is true when a late url was still reported to the host.
    Stale { delivered: bool },
}

#[derive(Clone)]
pub struct UploadCoordinator {
    uploader: Arc<dyn FileUploader>,
    notifier: Arc<dyn ChangeNotifier>,
    arena: Arc<Mutex<UploadArena>>,
    policy: StaleUploadPolicy,
    diagnostics: Diagnostics,
}

impl UploadCoordinator {
    pub fn new(
        uploader: Arc<dyn FileUploader>,
        notifier: Arc<dyn ChangeNotifier>,
        policy: StaleUploadPolicy,
        diagnostics: Diagnostics,
    ) -> Self {
        Self {
            uploader,
            notifier,
            arena: Arc::new(Mutex::new(UploadArena::new())),
            policy,
            diagnostics,
        }
    }

    /// Start uploading `file` for `field_id`.
    ///
    /// The field is marked uploading before this returns. A previous
    /// in-flight attempt on the same field stops being tracked. The returned
    /// handle resolves once the attempt has been applied.
    pub async fn select_file(&self, field_id: DbId, file: UploadFile) -> JoinHandle<UploadOutcome> {
        let described = file.describe();
        let begun = self.arena.lock().await.begin(field_id, described.clone());

        if let Some(previous) = begun.superseded {
            tracing::debug!(
                field_id,
                previous_generation = previous,
                generation = begun.ticket.generation,
                "Superseding in-flight upload",
            );
        }
        tracing::info!(
            field_id,
            file_name = %described.name,
            size = described.size,
            "Upload started",
        );
        self.diagnostics.emit(
            EngineEvent::new(EVENT_UPLOAD_STARTED)
                .with_field(field_id)
                .with_payload(json!({
                    "file_name": described.name,
                    "size": described.size,
                    "generation": begun.ticket.generation,
                    "superseded": begun.superseded,
                })),
        );

        let coordinator = self.clone();
        tokio::spawn(async move { coordinator.run(begun.ticket, file).await })
    }

    async fn run(self, ticket: UploadTicket, file: UploadFile) -> UploadOutcome {
        match self.uploader.upload_file(ticket.field_id, file).await {
            Ok(uploaded) => self.complete(ticket, uploaded.url).await,
            Err(e) => {
                tracing::warn!(
                    field_id = ticket.field_id,
                    generation = ticket.generation,
                    error = %e,
                    "Upload failed",
                );
                self.abort(ticket, e.to_string()).await
            }
        }
    }

    async fn complete(&self, ticket: UploadTicket, url: String) -> UploadOutcome {
        let completion = self.arena.lock().await.succeed(ticket, url.clone());
        match completion {
            Completion::Applied(_) => {
                tracing::info!(field_id = ticket.field_id, url = %url, "Upload succeeded");
                self.diagnostics.emit(
                    EngineEvent::new(EVENT_UPLOAD_SUCCEEDED)
                        .with_field(ticket.field_id)
                        .with_payload(json!({ "url": url, "generation": ticket.generation })),
                );
                self.notifier
                    .on_field_change(ticket.field_id, Value::String(url.clone()));
                UploadOutcome::Succeeded { url }
            }
            Completion::Stale => {
                let delivered = self.policy == StaleUploadPolicy::Deliver;
                tracing::warn!(
                    field_id = ticket.field_id,
                    generation = ticket.generation,
                    delivered,
                    "Upload resolved after being superseded or cleared",
                );
                self.diagnostics.emit(
                    EngineEvent::new(EVENT_UPLOAD_STALE_COMPLETION)
                        .with_field(ticket.field_id)
                        .with_payload(json!({
                            "outcome": "succeeded",
                            "url": url,
                            "generation": ticket.generation,
                            "delivered": delivered,
                        })),
                );
                if delivered {
                    self.notifier
                        .on_field_change(ticket.field_id, Value::String(url));
                }
                UploadOutcome::Stale { delivered }
            }
        }
    }

    async fn abort(&self, ticket: UploadTicket, error: String) -> UploadOutcome {
        let completion = self.arena.lock().await.fail(ticket);
        match completion {
            Completion::Applied(_) => {
                self.diagnostics.emit(
                    EngineEvent::new(EVENT_UPLOAD_FAILED)
                        .with_field(ticket.field_id)
                        .with_payload(json!({ "error": error, "generation": ticket.generation })),
                );
                self.arena.lock().await.settle(ticket.field_id);
                UploadOutcome::Failed
            }
            Completion::Stale => {
                self.diagnostics.emit(
                    EngineEvent::new(EVENT_UPLOAD_STALE_COMPLETION)
                        .with_field(ticket.field_id)
                        .with_payload(json!({
                            "outcome": "failed",
                            "error": error,
                            "generation": ticket.generation,
                            "delivered": false,
                        })),
                );
                UploadOutcome::Stale { delivered: false }
            }
        }
    }

    /// Reset a field to idle and report an empty value to the host.
    ///
    /// An in-flight attempt on the field becomes stale.
    pub async fn clear(&self, field_id: DbId) -> UploadState {
        let state = self.arena.lock().await.clear(field_id);
        tracing::debug!(field_id, "Upload cleared");
        self.diagnostics
            .emit(EngineEvent::new(EVENT_UPLOAD_CLEARED).with_field(field_id));
        self.notifier
            .on_field_change(field_id, Value::String(String::new()));
        state
    }

    pub async fn state(&self, field_id: DbId) -> UploadState {
        self.arena.lock().await.get(field_id)
    }

    /// Copy of the whole arena, for rendering.
    pub async fn snapshot(&self) -> UploadArena {
        self.arena.lock().await.clone()
    }

    pub async fn in_flight(&self) -> usize {
        self.arena.lock().await.in_flight()
    }
}
