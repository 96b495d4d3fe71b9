//! Lifecycle notifications announced by configuration stores.
//!
//! Every `load()` and `save()` call produces exactly two events: a *Starting*
//! event before any I/O happens and a *Finished* event carrying the final
//! outcome.  Subscribers (for example a component caching values derived from
//! the config) can use the Finished event to refresh their state.
//!
//! The carried [`ConfigHandle`] can be downcast back to the concrete store to
//! read the data it holds:
//!
//! ```ignore
//! bus.subscribe(|event| {
//!     if let ConfigEvent::LoadFinished { store, success: true } = event {
//!         if let Some(settings) = store.downcast_ref::<TypedConfigStore<Settings>>() {
//!             refresh_cache(settings.data());
//!         }
//!     }
//! });
//! ```

use std::any::Any;
use std::fmt;

/// Read-only view of a store, carried by every [`ConfigEvent`].
///
/// Events are shared across stores of different target types, so they carry
/// this object-safe view instead of the generic store itself.
pub trait ConfigHandle {
    /// The store identifier (file stem of the backing file).
    fn id(&self) -> &str;
    /// Whether the store currently holds a valid instance.
    fn is_loaded(&self) -> bool;
    /// The target type's own tag (its fully-qualified Rust type name).
    fn type_tag(&self) -> &str;
    /// The concrete store, for downcasting.
    fn as_any(&self) -> &dyn Any;
}

impl<'a> dyn ConfigHandle + 'a {
    /// Returns the concrete store if it is an `S`.
    pub fn downcast_ref<S: Any>(&self) -> Option<&S> {
        self.as_any().downcast_ref::<S>()
    }
}

/// A lifecycle notification.
#[derive(Clone, Copy)]
pub enum ConfigEvent<'a> {
    /// A load cycle is about to start.
    LoadStarting { store: &'a dyn ConfigHandle },
    /// A load cycle finished; `success` is the value `load()` returns.
    LoadFinished {
        store: &'a dyn ConfigHandle,
        success: bool,
    },
    /// A save is about to start.
    SaveStarting { store: &'a dyn ConfigHandle },
    /// A save finished; `success` is the value `save()` returns.
    SaveFinished {
        store: &'a dyn ConfigHandle,
        success: bool,
    },
}

/// Discriminant of a [`ConfigEvent`], convenient for matching and recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigEventKind {
    LoadStarting,
    LoadFinished,
    SaveStarting,
    SaveFinished,
}

impl<'a> ConfigEvent<'a> {
    /// The store that produced this event.
    pub fn store(&self) -> &'a dyn ConfigHandle {
        match *self {
            Self::LoadStarting { store }
            | Self::LoadFinished { store, .. }
            | Self::SaveStarting { store }
            | Self::SaveFinished { store, .. } => store,
        }
    }

    /// Shorthand for `self.store().id()`.
    pub fn config_id(&self) -> &'a str {
        self.store().id()
    }

    pub fn kind(&self) -> ConfigEventKind {
        match self {
            Self::LoadStarting { .. } => ConfigEventKind::LoadStarting,
            Self::LoadFinished { .. } => ConfigEventKind::LoadFinished,
            Self::SaveStarting { .. } => ConfigEventKind::SaveStarting,
            Self::SaveFinished { .. } => ConfigEventKind::SaveFinished,
        }
    }

    /// The outcome for Finished events, `None` for Starting events.
    pub fn success(&self) -> Option<bool> {
        match *self {
            Self::LoadFinished { success, .. } | Self::SaveFinished { success, .. } => {
                Some(success)
            }
            Self::LoadStarting { .. } | Self::SaveStarting { .. } => None,
        }
    }
}

impl fmt::Debug for ConfigEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigEvent")
            .field("kind", &self.kind())
            .field("config", &self.config_id())
            .field("success", &self.success())
            .finish()
    }
}

impl fmt::Display for ConfigEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::LoadStarting => "load-starting",
            Self::LoadFinished => "load-finished",
            Self::SaveStarting => "save-starting",
            Self::SaveFinished => "save-finished",
        };
        f.write_str(name)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
