//! Recording event sink for tests.
//!
//! Captures every posted [`ConfigEvent`] as an owned [`RecordedEvent`] so tests
//! can inspect ordering and outcomes after the store call returns.

use std::sync::Mutex;

use super::ConfigEventSink;
use crate::domain::events::{ConfigEvent, ConfigEventKind};

/// Owned snapshot of a [`ConfigEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEvent {
    pub kind: ConfigEventKind,
    pub config_id: String,
    pub success: Option<bool>,
    /// The store's `is_loaded()` at the moment the event was posted.
    pub store_loaded: bool,
}

/// A [`ConfigEventSink`] that remembers everything it receives.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<RecordedEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all events recorded so far.
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().expect("lock poisoned").clone()
    }

    /// Returns only the kinds, in order.
    pub fn kinds(&self) -> Vec<ConfigEventKind> {
        self.events().into_iter().map(|e| e.kind).collect()
    }

    /// Forgets all recorded events.
    pub fn clear(&self) {
        self.events.lock().expect("lock poisoned").clear();
    }
}

impl ConfigEventSink for RecordingSink {
    fn post(&self, event: &ConfigEvent<'_>) {
        let recorded = RecordedEvent {
            kind: event.kind(),
            config_id: event.config_id().to_string(),
            success: event.success(),
            store_loaded: event.store().is_loaded(),
        };
        self.events.lock().expect("lock poisoned").push(recorded);
    }
}
