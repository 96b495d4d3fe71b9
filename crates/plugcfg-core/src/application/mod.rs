//! Application layer: the configuration store.
//!
//! - **`store`** – [`store::TypedConfigStore`] orchestrates the load / save
//!   cycle: it resolves the backing file through the storage helpers, decodes
//!   it through a [`crate::DocumentCodec`], falls back to a default template
//!   when the file is missing, and announces every cycle on a
//!   [`crate::ConfigEventSink`].

pub mod store;
