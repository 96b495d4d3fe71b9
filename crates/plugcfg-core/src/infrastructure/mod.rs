//! Infrastructure layer for configuration stores.
//!
//! Contains the adapters that touch the outside world: the YAML codec, the
//! configs directory on disk, the plugin host abstraction, and the event bus.
//!
//! **Dependency rule**: this layer may depend on `domain`, but MUST NOT import
//! from `application`.

pub mod codec;
pub mod events;
pub mod host;
pub mod storage;
