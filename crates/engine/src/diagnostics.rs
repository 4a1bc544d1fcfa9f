//! Thin wrapper that publishes engine events when a bus is attached.

use std::sync::Arc;

use cfe_events::{EngineEvent, EventBus};

#[derive(Clone, Default)]
pub struct Diagnostics {
    bus: Option<Arc<EventBus>>,
}

impl Diagnostics {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self { bus: Some(bus) }
    }

    pub fn disabled() -> Self {
        Self { bus: None }
    }

    pub fn emit(&self, event: EngineEvent) {
        if let Some(bus) = &self.bus {
            bus.publish(event);
        }
    }
}
