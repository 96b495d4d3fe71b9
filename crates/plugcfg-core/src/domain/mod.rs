//! Domain types for configuration stores.
//!
//! Nothing in this module performs I/O.  It defines:
//!
//! - **`allow_list`** – which YAML type tags a document may carry.  This is the
//!   one place where untrusted file content meets type resolution, so it is
//!   modelled as its own type rather than hidden inside the codec.
//! - **`events`** – the four lifecycle notifications a store announces.

pub mod allow_list;
pub mod events;
