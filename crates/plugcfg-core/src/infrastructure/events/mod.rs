//! Event dispatch for store lifecycle notifications.
//!
//! Stores hold an `Arc<dyn ConfigEventSink>` and post to it synchronously from
//! inside `load()` / `save()`.  [`EventBus`] is the stock implementation: it
//! forwards every event to each subscribed handler, in subscription order.
//!
//! # Testability
//!
//! [`mock::RecordingSink`] records every event it receives so tests can assert
//! on ordering and outcomes.

use std::sync::RwLock;

use tracing::trace;

use crate::domain::events::ConfigEvent;

pub mod mock;

/// Receiver of store lifecycle events.
///
/// `post` is called on the store's own thread and must not block.
pub trait ConfigEventSink: Send + Sync {
    fn post(&self, event: &ConfigEvent<'_>);
}

type Handler = Box<dyn Fn(&ConfigEvent<'_>) + Send + Sync>;

/// Fan-out dispatcher shared by every store of a process.
///
/// Handlers run synchronously inside `post`.  A handler must not call
/// [`EventBus::subscribe`] on the same bus; the subscriber list is locked for
/// the duration of the dispatch.
#[derive(Default)]
pub struct EventBus {
    handlers: RwLock<Vec<Handler>>,
}

impl EventBus {
    /// Creates a bus with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` to receive every subsequent event.
    pub fn subscribe<F>(&self, handler: F)
    where
        F: Fn(&ConfigEvent<'_>) + Send + Sync + 'static,
    {
        let mut handlers = match self.handlers.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        handlers.push(Box::new(handler));
    }

    /// Number of registered handlers.
    pub fn subscriber_count(&self) -> usize {
        match self.handlers.read() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}

impl ConfigEventSink for EventBus {
    fn post(&self, event: &ConfigEvent<'_>) {
        let handlers = match self.handlers.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        trace!(
            kind = %event.kind(),
            config = event.config_id(),
            subscribers = handlers.len(),
            "dispatching config event"
        );
        for handler in handlers.iter() {
            handler(event);
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
