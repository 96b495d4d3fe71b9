//! # plugcfg-core
//!
//! Typed configuration stores for plugin hosts.
//!
//! A [`TypedConfigStore`] binds a Rust type `T` to a YAML file under the
//! plugin's data folder (`<data-folder>/configs/<id>.yml`).  Constructing a
//! store loads the file immediately; when the file does not exist yet a
//! default `T` is written out as a template and loaded back.
//!
//! # Architecture overview (for beginners)
//!
//! The crate follows the same three-layer split as the rest of the workspace:
//!
//! - **`domain`** – Pure types with no I/O: the type-tag allow-list that guards
//!   deserialization, and the lifecycle events a store announces.
//!
//! - **`infrastructure`** – Adapters that touch the outside world: the YAML
//!   codec, the configs directory on disk, the host abstraction, and the event
//!   bus that fans notifications out to subscribers.
//!
//! - **`application`** – The store itself, which orchestrates the load / save
//!   cycle on top of the infrastructure traits.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use plugcfg_core::{DataFolderHost, EventBus, StoreOptions, TypedConfigStore};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! struct Settings {
//!     port: u16,
//!     motd: String,
//! }
//!
//! impl Default for Settings {
//!     fn default() -> Self {
//!         Self { port: 25565, motd: "A server".to_string() }
//!     }
//! }
//!
//! let host = Arc::new(DataFolderHost::new("my-plugin", "/srv/plugins/my-plugin"));
//! let bus = Arc::new(EventBus::new());
//! let store = TypedConfigStore::<Settings>::with_default(host, bus, "main", StoreOptions::default())
//!     .expect("configs directory must be usable");
//! assert!(store.is_loaded());
//! ```

pub mod application;
pub mod domain;
pub mod infrastructure;

// Re-export the most-used types at the crate root so callers can write
// `plugcfg_core::TypedConfigStore` instead of the full module path.
pub use application::store::{DefaultError, StoreError, StoreOptions, TypedConfigStore};
pub use domain::allow_list::{TagInspector, TypeTagAllowList};
pub use domain::events::{ConfigEvent, ConfigEventKind, ConfigHandle};
pub use infrastructure::codec::{CodecError, DocumentCodec, YamlCodec};
pub use infrastructure::events::{ConfigEventSink, EventBus};
pub use infrastructure::host::{DataFolderHost, PluginHost};
