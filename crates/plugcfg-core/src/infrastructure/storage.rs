//! On-disk layout of configuration files.
//!
//! ```text
//! <data-folder>/
//! └── configs/
//!     ├── main.yml
//!     └── messages.yml
//! ```
//!
//! One file per store identifier.  The `configs/` directory is created on
//! first use.  If something other than a directory already sits at that path
//! the deployment is broken, and that is reported as a fatal error rather than
//! worked around.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// Name of the subdirectory of the data folder holding config files.
pub const CONFIGS_DIR_NAME: &str = "configs";

/// Environment problems with the configs directory.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The configs directory did not exist and could not be created.
    #[error("cannot create configuration directory at {path}: {source}")]
    CreateConfigsDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configs path exists but is not a directory.
    #[error("there is something other than a directory at {path}")]
    ConfigsPathNotDirectory { path: PathBuf },

    /// A store identifier that is not a plain file stem.
    #[error("invalid config id {id:?}: must be a non-empty file stem without path separators")]
    InvalidConfigId { id: String },
}

/// Resolves `<data_folder>/configs`, creating it if needed.
///
/// # Errors
///
/// Returns [`StorageError::CreateConfigsDir`] when the directory cannot be
/// created and [`StorageError::ConfigsPathNotDirectory`] when the path is
/// occupied by a non-directory.
pub fn ensure_configs_dir(data_folder: &Path) -> Result<PathBuf, StorageError> {
    let dir = data_folder.join(CONFIGS_DIR_NAME);

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|source| StorageError::CreateConfigsDir {
            path: dir.clone(),
            source,
        })?;
        debug!(path = %dir.display(), "created configuration directory");
    } else if !dir.is_dir() {
        return Err(StorageError::ConfigsPathNotDirectory { path: dir });
    }

    Ok(dir)
}

/// Checks that `id` names a file directly inside the configs directory.
///
/// Empty ids, `.`, `..`, and ids containing `/` or `\\` are rejected.
///
/// # Errors
///
/// Returns [`StorageError::InvalidConfigId`].
pub fn validate_config_id(id: &str) -> Result<(), StorageError> {
    let plain = !id.is_empty() && id != "." && id != ".." && !id.contains(['/', '\\']);
    if plain {
        Ok(())
    } else {
        Err(StorageError::InvalidConfigId { id: id.to_string() })
    }
}

/// Path of the backing file for store `id`.  `id` must already have passed
/// [`validate_config_id`].
pub fn config_file_path(configs_dir: &Path, id: &str, extension: &str) -> PathBuf {
    configs_dir.join(format!("{id}.{extension}"))
}

/// Lists regular files in `configs_dir` whose extension is `extension`.
///
/// An unreadable directory yields an empty list.  The result is sorted.
pub fn list_config_files(configs_dir: &Path, extension: &str) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(configs_dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(path = %configs_dir.display(), "cannot list configuration directory: {e}");
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some(extension))
        .collect();
    files.sort();
    files
}

/// Identifiers of all configs in `configs_dir` (file names minus extension).
pub fn list_config_names(configs_dir: &Path, extension: &str) -> BTreeSet<String> {
    list_config_files(configs_dir, extension)
        .iter()
        .filter_map(|path| path.file_stem().and_then(|s| s.to_str()))
        .map(str::to_string)
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
