//! Pure domain logic for the dynamic custom field engine.
//!
//! Everything in this crate is free of I/O: field definitions and values,
//! validation payload parsing, rendering to typed controls, edit coercion,
//! hydration merging, the per-field upload state machine, and the
//! collaborator traits the async layer is built on.

pub mod advisory;
pub mod collaborator;
pub mod constraints;
pub mod control;
pub mod definition;
pub mod edit;
pub mod engine_events;
pub mod error;
pub mod hydration;
pub mod render;
pub mod types;
pub mod upload;
