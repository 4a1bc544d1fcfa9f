//! Async orchestration for the custom field engine.
//!
//! [`FieldSession`] ties together the [`DefinitionLoader`], the
//! [`ValueHydrator`], and the [`UploadCoordinator`], and renders through the
//! pure renderer in `cfe_core`. Every failure is absorbed into a degraded
//! but usable view and reported through `tracing` and the diagnostic
//! [`EventBus`](cfe_events::EventBus).

pub mod config;
pub mod coordinator;
pub mod diagnostics;
pub mod hydrator;
pub mod loader;
pub mod session;

pub use config::{EngineConfig, StaleUploadPolicy};
pub use coordinator::{UploadCoordinator, UploadOutcome};
pub use hydrator::{HydrationOutcome, ValueHydrator};
pub use loader::{DefinitionLoader, DefinitionsState};
pub use session::{Collaborators, FieldSession, HydrationStatus};
