//! Diagnostic event type constants published by the field engine.
//!
//! Every fail-open degradation and upload transition has an event so a host
//! can surface problems the engine itself absorbs.

/// Definitions for a section were fetched.
pub const EVENT_DEFINITIONS_LOADED: &str = "definitions.loaded";

/// Definitions could not be fetched; the section renders no custom fields.
pub const EVENT_DEFINITIONS_LOAD_FAILED: &str = "definitions.load_failed";

/// Stored values were fetched and seeded.
pub const EVENT_VALUES_HYDRATED: &str = "values.hydrated";

/// Stored values could not be fetched; fields start at their defaults.
pub const EVENT_VALUES_HYDRATION_FAILED: &str = "values.hydration_failed";

/// A field rendered with degraded metadata (bad validation, unknown type).
pub const EVENT_FIELD_RENDER_DEGRADED: &str = "field.render_degraded";

/// A file was selected and its upload started.
pub const EVENT_UPLOAD_STARTED: &str = "upload.started";

/// An upload returned a stored-location reference.
pub const EVENT_UPLOAD_SUCCEEDED: &str = "upload.succeeded";

/// An upload failed; the field reverted to idle.
pub const EVENT_UPLOAD_FAILED: &str = "upload.failed";

/// A superseded or cleared upload resolved after the fact.
pub const EVENT_UPLOAD_STALE_COMPLETION: &str = "upload.stale_completion";

/// A file field was explicitly cleared.
pub const EVENT_UPLOAD_CLEARED: &str = "upload.cleared";
