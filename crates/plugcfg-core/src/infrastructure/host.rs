//! The plugin host a store belongs to.
//!
//! A host supplies two things: a data folder (the store keeps its files in
//! `<data-folder>/configs/`) and a name, used to label log output.

use std::path::PathBuf;

/// The owning plugin, as seen by a configuration store.
///
/// Implementations are shared between all stores of one plugin, hence the
/// `Send + Sync` bound.
#[cfg_attr(test, mockall::automock)]
pub trait PluginHost: Send + Sync {
    /// Human-readable plugin name, attached to every log record.
    fn name(&self) -> String;
    /// Root directory the plugin may write its data into.
    fn data_folder(&self) -> PathBuf;
}

/// A host described by a fixed name and data folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFolderHost {
    name: String,
    data_folder: PathBuf,
}

impl DataFolderHost {
    pub fn new(name: impl Into<String>, data_folder: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            data_folder: data_folder.into(),
        }
    }
}

impl PluginHost for DataFolderHost {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn data_folder(&self) -> PathBuf {
        self.data_folder.clone()
    }
}
