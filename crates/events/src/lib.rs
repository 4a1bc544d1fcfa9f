//! Diagnostic event bus for the custom field engine.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`EngineEvent`]: the structured diagnostic envelope.
//!
//! The engine never requires a subscriber; publishing into an empty bus is a
//! no-op, so fail-open behavior is unchanged whether or not a host listens.

pub mod bus;

pub use bus::{EngineEvent, EventBus};
