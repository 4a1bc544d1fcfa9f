//! Per-field upload state machine.
//!
//! States: `Idle -> Uploading -> Succeeded | Failed`, `Failed -> Idle` on
//! settle, and any state `-> Idle` on an explicit clear. Transitions are pure
//! functions over [`UploadState`]; [`UploadArena`] stores one state per field
//! id and is the only mutable upload bookkeeping the engine keeps.
//!
//! Every `begin` bumps a per-field generation. A completion whose ticket no
//! longer matches the tracked generation (or arrives after a clear) is
//! reported as [`Completion::Stale`] and leaves the tracked state untouched.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::DbId;

/// Phase of a field's upload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadPhase {
    #[default]
    Idle,
    Uploading,
    Succeeded,
    Failed,
}

/// Metadata of a locally selected file. The bytes live with the in-flight
/// upload task, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalFile {
    pub name: String,
    pub content_type: Option<String>,
    pub size: u64,
}

/// Upload tracking for one field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadState {
    pub phase: UploadPhase,
    /// Present only while uploading.
    pub file: Option<LocalFile>,
    /// Stored-location reference after a successful upload.
    pub url: Option<String>,
    pub generation: u64,
}

/// Identifies one upload attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UploadTicket {
    pub field_id: DbId,
    pub generation: u64,
}

/// Result of applying a completion to the tracked state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// The completion belonged to the tracked attempt; this is the new state.
    Applied(UploadState),
    /// The attempt was superseded or cleared; tracked state was not changed.
    Stale,
}

impl UploadState {
    pub fn is_uploading(&self) -> bool {
        self.phase == UploadPhase::Uploading
    }

    /// Start a new attempt. Any previous in-flight attempt is superseded.
    pub fn begin(&self, field_id: DbId, file: LocalFile) -> (UploadState, UploadTicket) {
        let generation = self.generation + 1;
        let next = UploadState {
            phase: UploadPhase::Uploading,
            file: Some(file),
            url: None,
            generation,
        };
        (next, UploadTicket { field_id, generation })
    }

    fn owns(&self, ticket: UploadTicket) -> bool {
        self.is_uploading() && self.generation == ticket.generation
    }

    /// `Uploading -> Succeeded`, releasing the file and recording `url`.
    pub fn succeed(&self, ticket: UploadTicket, url: String) -> Completion {
        if !self.owns(ticket) {
            return Completion::Stale;
        }
        Completion::Applied(UploadState {
            phase: UploadPhase::Succeeded,
            file: None,
            url: Some(url),
            generation: self.generation,
        })
    }

    /// `Uploading -> Failed`, clearing file and url.
    pub fn fail(&self, ticket: UploadTicket) -> Completion {
        if !self.owns(ticket) {
            return Completion::Stale;
        }
        Completion::Applied(UploadState {
            phase: UploadPhase::Failed,
            file: None,
            url: None,
            generation: self.generation,
        })
    }

    /// `Failed -> Idle`; other phases are returned unchanged.
    pub fn settle(&self) -> UploadState {
        match self.phase {
            UploadPhase::Failed => self.reset(),
            UploadPhase::Idle | UploadPhase::Uploading | UploadPhase::Succeeded => self.clone(),
        }
    }

    /// Any phase `-> Idle`, dropping file and url tracking.
    pub fn reset(&self) -> UploadState {
        UploadState {
            phase: UploadPhase::Idle,
            file: None,
            url: None,
            generation: self.generation,
        }
    }
}

// ---------------------------------------------------------------------------
// Arena
// ---------------------------------------------------------------------------

/// Outcome of [`UploadArena::begin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Begun {
    pub ticket: UploadTicket,
    /// Generation of an attempt that was still in flight and is now untracked.
    pub superseded: Option<u64>,
}

/// Upload states indexed by field id.
#[derive(Debug, Clone, Default)]
pub struct UploadArena {
    states: HashMap<DbId, UploadState>,
}

impl UploadArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state for a field; untouched fields are idle.
    pub fn get(&self, field_id: DbId) -> UploadState {
        self.states.get(&field_id).cloned().unwrap_or_default()
    }

    pub fn is_uploading(&self, field_id: DbId) -> bool {
        self.states
            .get(&field_id)
            .is_some_and(UploadState::is_uploading)
    }

    pub fn begin(&mut self, field_id: DbId, file: LocalFile) -> Begun {
        let current = self.get(field_id);
        let superseded = current.is_uploading().then_some(current.generation);
        let (next, ticket) = current.begin(field_id, file);
        self.states.insert(field_id, next);
        Begun { ticket, superseded }
    }

    pub fn succeed(&mut self, ticket: UploadTicket, url: String) -> Completion {
        let completion = self.get(ticket.field_id).succeed(ticket, url);
        self.store(ticket.field_id, &completion);
        completion
    }

    pub fn fail(&mut self, ticket: UploadTicket) -> Completion {
        let completion = self.get(ticket.field_id).fail(ticket);
        self.store(ticket.field_id, &completion);
        completion
    }

    pub fn settle(&mut self, field_id: DbId) -> UploadState {
        let next = self.get(field_id).settle();
        self.states.insert(field_id, next.clone());
        next
    }

    pub fn clear(&mut self, field_id: DbId) -> UploadState {
        let next = self.get(field_id).reset();
        self.states.insert(field_id, next.clone());
        next
    }

    /// Number of fields with an upload in flight.
    pub fn in_flight(&self) -> usize {
        self.states.values().filter(|s| s.is_uploading()).count()
    }

    fn store(&mut self, field_id: DbId, completion: &Completion) {
        if let Completion::Applied(state) = completion {
            self.states.insert(field_id, state.clone());
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
