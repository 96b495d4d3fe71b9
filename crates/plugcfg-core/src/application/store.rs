//! Typed, file-backed configuration store.
//!
//! # Load cycle
//!
//! ```text
//!            ┌──────────────┐  parsed   ┌────────────────┐
//!  load() ─▶ │   Attempt    │ ────────▶ │ Done(success)  │
//!            └──────────────┘           └────────────────┘
//!              │  │ missing file, first time in this call
//!              │  └──▶ save_template() ──▶ Attempt (once)
//!              │
//!              │ missing file again / I/O error / bad document
//!              ▼
//!            ┌────────────────┐
//!            │ Done(failure)  │   (logged, never retried)
//!            └────────────────┘
//! ```
//!
//! The template recovery runs at most once per `load()` call.  If the template
//! could not be written, the second attempt finds the file still missing and
//! the call ends with `Ok(false)` instead of looping.
//!
//! # Errors vs. outcomes
//!
//! Recoverable problems (missing file after recovery, malformed YAML, a
//! disallowed type tag, an I/O error while reading or writing) are logged with
//! `tracing` and reported as `Ok(false)`.  Only broken-environment conditions
//! and programmer errors are returned as [`StoreError`].

use std::any::type_name;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::domain::allow_list::TypeTagAllowList;
use crate::domain::events::{ConfigEvent, ConfigHandle};
use crate::infrastructure::codec::{CodecError, DocumentCodec, YamlCodec};
use crate::infrastructure::events::ConfigEventSink;
use crate::infrastructure::host::PluginHost;
use crate::infrastructure::storage::{self, StorageError};

/// Error returned by a default-instance factory.
pub type DefaultError = Box<dyn std::error::Error + Send + Sync>;

type DefaultFactory<T> = Box<dyn Fn() -> Result<T, DefaultError> + Send + Sync>;

/// Fatal store errors.
///
/// None of these are produced by an ordinary unreadable or missing file; those
/// end up as a `false` outcome plus a log record.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The configs directory is unusable.  The deployment is broken.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// `data()` / `data_mut()` was called while the store holds no valid
    /// instance.  Check [`TypedConfigStore::is_loaded`] first.
    #[error("config with id {id} is not loaded")]
    NotLoaded { id: String },

    /// The default-instance factory failed; there is no fallback.
    #[error("cannot construct a default instance of {type_name}: {source}")]
    DefaultConstruction {
        type_name: &'static str,
        #[source]
        source: DefaultError,
    },
}

/// Construction-time options.
#[derive(Debug, Clone)]
pub struct StoreOptions<C = YamlCodec> {
    /// Type tags accepted in documents in addition to the target type's own.
    pub extra_allowed_tags: BTreeSet<String>,
    /// Codec used to read and write the backing file.
    pub codec: C,
}

impl Default for StoreOptions<YamlCodec> {
    fn default() -> Self {
        Self {
            extra_allowed_tags: BTreeSet::new(),
            codec: YamlCodec,
        }
    }
}

impl<C> StoreOptions<C> {
    /// Widens the allow-list by one tag.
    #[must_use]
    pub fn allow_tag(mut self, tag: impl Into<String>) -> Self {
        self.extra_allowed_tags.insert(tag.into());
        self
    }

    /// Swaps the codec, keeping the allow-list.
    #[must_use]
    pub fn with_codec<D>(self, codec: D) -> StoreOptions<D> {
        StoreOptions {
            extra_allowed_tags: self.extra_allowed_tags,
            codec,
        }
    }
}

/// Why a single load attempt failed.
#[derive(Debug, Error)]
enum LoadFailure {
    #[error("{0}")]
    Missing(#[source] std::io::Error),
    #[error("{0}")]
    Io(#[source] std::io::Error),
    #[error("{0}")]
    Codec(#[from] CodecError),
}

/// A configuration of type `T` persisted at `<data-folder>/configs/<id>.yml`.
///
/// See the [module documentation](self) for the load cycle.
pub struct TypedConfigStore<T, C = YamlCodec> {
    host: Arc<dyn PluginHost>,
    events: Arc<dyn ConfigEventSink>,
    id: String,
    allowed_tags: TypeTagAllowList,
    codec: C,
    default_factory: DefaultFactory<T>,
    loaded: bool,
    data: Option<T>,
}

impl<T, C> TypedConfigStore<T, C>
where
    T: Serialize + DeserializeOwned + 'static,
    C: DocumentCodec + 'static,
{
    /// Creates a store and immediately loads it.
    ///
    /// `default_factory` builds the instance written as a template when the
    /// backing file does not exist.
    ///
    /// A failed load does not fail construction; the store is returned with
    /// `is_loaded() == false`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] when `id` is not a plain file stem or
    /// the configs directory is unusable, and
    /// [`StoreError::DefaultConstruction`] when a template was needed but
    /// `default_factory` failed.
    pub fn new<F>(
        host: Arc<dyn PluginHost>,
        events: Arc<dyn ConfigEventSink>,
        id: impl Into<String>,
        default_factory: F,
        options: StoreOptions<C>,
    ) -> Result<Self, StoreError>
    where
        F: Fn() -> Result<T, DefaultError> + Send + Sync + 'static,
    {
        let id = id.into();
        storage::validate_config_id(&id)?;
        let allowed_tags =
            TypeTagAllowList::for_target(type_name::<T>(), &options.extra_allowed_tags);

        let mut store = Self {
            host,
            events,
            id,
            allowed_tags,
            codec: options.codec,
            default_factory: Box::new(default_factory),
            loaded: false,
            data: None,
        };
        store.load()?;
        Ok(store)
    }

    /// Like [`new`](Self::new), using `T::default()` as the template.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] when the configs directory is unusable.
    pub fn with_default(
        host: Arc<dyn PluginHost>,
        events: Arc<dyn ConfigEventSink>,
        id: impl Into<String>,
        options: StoreOptions<C>,
    ) -> Result<Self, StoreError>
    where
        T: Default,
    {
        Self::new(host, events, id, || Ok(T::default()), options)
    }

    // ── Data access ──────────────────────────────────────────────────────────

    /// The current instance.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotLoaded`] if the store holds no valid instance.
    pub fn data(&self) -> Result<&T, StoreError> {
        match (&self.data, self.loaded) {
            (Some(data), true) => Ok(data),
            _ => Err(self.not_loaded()),
        }
    }

    /// Mutable access to the current instance; call [`save`](Self::save) to
    /// persist changes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotLoaded`] if the store holds no valid instance.
    pub fn data_mut(&mut self) -> Result<&mut T, StoreError> {
        if !self.loaded {
            return Err(self.not_loaded());
        }
        let id = &self.id;
        self.data.as_mut().ok_or_else(|| StoreError::NotLoaded { id: id.clone() })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn host(&self) -> &Arc<dyn PluginHost> {
        &self.host
    }

    /// Tags accepted in the backing document.  Always includes
    /// [`type_tag`](ConfigHandle::type_tag).
    pub fn allowed_tags(&self) -> &TypeTagAllowList {
        &self.allowed_tags
    }

    /// Path of the backing file, creating the configs directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] when the configs directory is unusable.
    pub fn config_path(&self) -> Result<PathBuf, StoreError> {
        let dir = self.configs_dir()?;
        Ok(storage::config_file_path(&dir, &self.id, self.codec.extension()))
    }

    // ── Load ─────────────────────────────────────────────────────────────────

    /// Reloads the backing file, replacing the current instance.
    ///
    /// Posts `LoadStarting` before and `LoadFinished` after the attempt.  The
    /// Finished event is posted even when the attempt fails, and carries the
    /// returned outcome (`false` when an error is returned).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] or [`StoreError::DefaultConstruction`];
    /// ordinary load failures are `Ok(false)`.
    pub fn load(&mut self) -> Result<bool, StoreError> {
        let events = Arc::clone(&self.events);

        events.post(&ConfigEvent::LoadStarting { store: &*self });
        let outcome = self.try_load();
        let success = matches!(outcome, Ok(true));
        events.post(&ConfigEvent::LoadFinished {
            store: &*self,
            success,
        });

        outcome
    }

    fn try_load(&mut self) -> Result<bool, StoreError> {
        let plugin = self.host.name();
        let mut recovered = false;

        loop {
            self.loaded = false;
            let path = self.config_path()?;

            match self.read_document(&path) {
                Ok(data) => {
                    self.data = Some(data);
                    self.loaded = true;
                    debug!(plugin = %plugin, config = %self.id, path = %path.display(), "configuration loaded");
                    return Ok(true);
                }
                Err(LoadFailure::Missing(e)) if recovered => {
                    error!(
                        plugin = %plugin,
                        config = %self.id,
                        path = %path.display(),
                        "failed to load configuration: saving the template and reloading did not help: {e}"
                    );
                    return Ok(false);
                }
                Err(LoadFailure::Missing(_)) => {
                    info!(
                        plugin = %plugin,
                        config = %self.id,
                        path = %path.display(),
                        "configuration file not found, writing default template"
                    );
                    recovered = true;
                    self.save_template()?;
                }
                Err(e) => {
                    error!(plugin = %plugin, config = %self.id, path = %path.display(), "failed to load configuration: {e}");
                    return Ok(false);
                }
            }
        }
    }

    fn read_document(&self, path: &Path) -> Result<T, LoadFailure> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LoadFailure::Missing(e)
            } else {
                LoadFailure::Io(e)
            }
        })?;
        let data = self
            .codec
            .decode(&text, type_name::<T>(), &self.allowed_tags)?;
        Ok(data)
    }

    // ── Save ─────────────────────────────────────────────────────────────────

    /// Replaces the current instance with a fresh default and writes it out.
    ///
    /// The store counts as loaded afterwards even if the write fails.  Posts no
    /// events.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DefaultConstruction`] if the factory fails and
    /// [`StoreError::Storage`] if the configs directory is unusable.
    pub fn save_template(&mut self) -> Result<(), StoreError> {
        let data = (self.default_factory)().map_err(|source| StoreError::DefaultConstruction {
            type_name: type_name::<T>(),
            source,
        })?;

        self.data = Some(data);
        self.loaded = true;
        self.try_save()?;
        Ok(())
    }

    /// Writes the current instance to the backing file.
    ///
    /// Posts `SaveStarting` before and `SaveFinished` after the write.  Returns
    /// `Ok(false)` without touching the file if nothing has been loaded.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] when the configs directory is unusable.
    pub fn save(&mut self) -> Result<bool, StoreError> {
        let events = Arc::clone(&self.events);

        events.post(&ConfigEvent::SaveStarting { store: &*self });
        let outcome = self.try_save();
        let success = matches!(outcome, Ok(true));
        events.post(&ConfigEvent::SaveFinished {
            store: &*self,
            success,
        });

        outcome
    }

    fn try_save(&self) -> Result<bool, StoreError> {
        let plugin = self.host.name();

        let Some(data) = self.data.as_ref().filter(|_| self.loaded) else {
            error!(
                plugin = %plugin,
                config = %self.id,
                "the configuration cannot be saved because it has not been loaded yet"
            );
            return Ok(false);
        };

        let path = self.config_path()?;
        let text = match self.codec.encode(data) {
            Ok(text) => text,
            Err(e) => {
                error!(plugin = %plugin, config = %self.id, "failed to save configuration: {e}");
                return Ok(false);
            }
        };

        if let Err(e) = std::fs::write(&path, text) {
            error!(plugin = %plugin, config = %self.id, path = %path.display(), "failed to save configuration: {e}");
            return Ok(false);
        }

        debug!(plugin = %plugin, config = %self.id, path = %path.display(), "configuration saved");
        Ok(true)
    }

    // ── Enumeration ──────────────────────────────────────────────────────────

    /// All backing files in this plugin's configs directory.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] when the configs directory is unusable.
    /// An unreadable directory yields an empty list.
    pub fn available_configs(&self) -> Result<Vec<PathBuf>, StoreError> {
        let dir = self.configs_dir()?;
        Ok(storage::list_config_files(&dir, self.codec.extension()))
    }

    /// Identifiers of all backing files in this plugin's configs directory.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] when the configs directory is unusable.
    pub fn available_config_names(&self) -> Result<BTreeSet<String>, StoreError> {
        let dir = self.configs_dir()?;
        Ok(storage::list_config_names(&dir, self.codec.extension()))
    }

    fn configs_dir(&self) -> Result<PathBuf, StoreError> {
        Ok(storage::ensure_configs_dir(&self.host.data_folder())?)
    }

    fn not_loaded(&self) -> StoreError {
        StoreError::NotLoaded {
            id: self.id.clone(),
        }
    }
}

impl<T: 'static, C: 'static> ConfigHandle for TypedConfigStore<T, C> {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn type_tag(&self) -> &str {
        type_name::<T>()
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

impl<T, C> std::fmt::Debug for TypedConfigStore<T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypedConfigStore")
            .field("id", &self.id)
            .field("type", &type_name::<T>())
            .field("loaded", &self.loaded)
            .field("allowed_tags", &self.allowed_tags)
            .finish_non_exhaustive()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::allow_list::TagInspector;
    use crate::domain::events::ConfigEventKind;
    use crate::infrastructure::events::mock::RecordingSink;
    use crate::infrastructure::host::MockPluginHost;
    use serde::Deserialize;
    use std::cell::Cell;
    use uuid::Uuid;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Settings {
        port: u16,
        motd: String,
    }

    impl Default for Settings {
        fn default() -> Self {
            Self {
                port: 25565,
                motd: "A server".to_string(),
            }
        }
    }

    /// YAML codec whose `encode` always fails, so templates never reach disk.
    #[derive(Default)]
    struct UnwritableCodec {
        decode_calls: Cell<u32>,
        encode_calls: Cell<u32>,
    }

    impl DocumentCodec for UnwritableCodec {
        fn extension(&self) -> &str {
            "yml"
        }

        fn decode<U: DeserializeOwned>(
            &self,
            text: &str,
            target_tag: &str,
            inspector: &dyn TagInspector,
        ) -> Result<U, CodecError> {
            self.decode_calls.set(self.decode_calls.get() + 1);
            YamlCodec.decode(text, target_tag, inspector)
        }

        fn encode<U: Serialize>(&self, _value: &U) -> Result<String, CodecError> {
            self.encode_calls.set(self.encode_calls.get() + 1);
            Err(CodecError::Serialize(serde::ser::Error::custom(
                "disk is read-only",
            )))
        }
    }

    fn temp_data_folder() -> PathBuf {
        std::env::temp_dir().join(format!("plugcfg_store_{}", Uuid::new_v4()))
    }

    fn mock_host(data: &Path) -> Arc<dyn PluginHost> {
        let mut host = MockPluginHost::new();
        host.expect_name().return_const("test-plugin".to_string());
        let data = data.to_path_buf();
        host.expect_data_folder().returning(move || data.clone());
        Arc::new(host)
    }

    #[test]
    fn test_new_store_synthesizes_template_through_host_folder() {
        // Arrange
        let data = temp_data_folder();
        let sink = Arc::new(RecordingSink::new());

        // Act
        let store = TypedConfigStore::<Settings>::with_default(
            mock_host(&data),
            sink.clone(),
            "main",
            StoreOptions::default(),
        )
        .expect("construct");

        // Assert
        assert!(store.is_loaded());
        assert_eq!(store.data().unwrap(), &Settings::default());
        assert!(data.join("configs").join("main.yml").is_file());

        std::fs::remove_dir_all(&data).ok();
    }

    #[test]
    fn test_allowed_tags_include_target_type_name() {
        let data = temp_data_folder();
        let store = TypedConfigStore::<Settings>::with_default(
            mock_host(&data),
            Arc::new(RecordingSink::new()),
            "main",
            StoreOptions::default().allow_tag("Extra"),
        )
        .unwrap();

        assert!(store.allowed_tags().contains(type_name::<Settings>()));
        assert!(store.allowed_tags().contains("Extra"));
        assert_eq!(store.allowed_tags().len(), 2);
        assert_eq!(store.type_tag(), type_name::<Settings>());

        std::fs::remove_dir_all(&data).ok();
    }

    #[test]
    fn test_failing_default_factory_is_fatal() {
        // Arrange
        let data = temp_data_folder();

        // Act
        let result = TypedConfigStore::<Settings>::new(
            mock_host(&data),
            Arc::new(RecordingSink::new()),
            "main",
            || Err("no default available".into()),
            StoreOptions::default(),
        );

        // Assert
        match result {
            Err(StoreError::DefaultConstruction { type_name, source }) => {
                assert!(type_name.ends_with("Settings"));
                assert_eq!(source.to_string(), "no default available");
            }
            other => panic!("expected DefaultConstruction, got {other:?}"),
        }

        std::fs::remove_dir_all(&data).ok();
    }

    #[test]
    fn test_template_recovery_runs_at_most_once_per_load() {
        // Arrange: the codec cannot write, so the template never appears
        let data = temp_data_folder();
        let sink = Arc::new(RecordingSink::new());

        // Act
        let mut store = TypedConfigStore::<Settings, UnwritableCodec>::with_default(
            mock_host(&data),
            sink.clone(),
            "main",
            StoreOptions::default().with_codec(UnwritableCodec::default()),
        )
        .expect("construction must not fail on a load failure");

        // Assert: one template write was attempted, and no file was ever read
        assert_eq!(store.codec.encode_calls.get(), 1);
        assert_eq!(store.codec.decode_calls.get(), 0);
        assert!(!store.is_loaded());
        assert!(matches!(store.data(), Err(StoreError::NotLoaded { .. })));
        assert!(!data.join("configs").join("main.yml").exists());
        assert_eq!(
            sink.events().last().map(|e| e.success),
            Some(Some(false))
        );

        // A second explicit load gets its own single recovery attempt.
        sink.clear();
        assert!(!store.load().unwrap());
        assert_eq!(
            sink.kinds(),
            vec![ConfigEventKind::LoadStarting, ConfigEventKind::LoadFinished]
        );
        assert_eq!(store.codec.encode_calls.get(), 2);
        assert_eq!(store.codec.decode_calls.get(), 0);

        std::fs::remove_dir_all(&data).ok();
    }

    #[test]
    fn test_id_escaping_configs_directory_is_rejected() {
        // Arrange
        let data = temp_data_folder();
        let sink = Arc::new(RecordingSink::new());

        // Act
        let result = TypedConfigStore::<Settings>::with_default(
            mock_host(&data),
            sink.clone(),
            "../other/main",
            StoreOptions::default(),
        );

        // Assert: rejected before any load cycle or filesystem access
        assert!(matches!(
            result,
            Err(StoreError::Storage(StorageError::InvalidConfigId { id })) if id == "../other/main"
        ));
        assert!(sink.events().is_empty());
        assert!(!data.exists());
    }

    #[test]
    fn test_unwritable_codec_still_reads_existing_files() {
        let data = temp_data_folder();
        let dir = storage::ensure_configs_dir(&data).unwrap();
        std::fs::write(dir.join("main.yml"), "port: 1\nmotd: hi\n").unwrap();

        let store = TypedConfigStore::<Settings, UnwritableCodec>::with_default(
            mock_host(&data),
            Arc::new(RecordingSink::new()),
            "main",
            StoreOptions::default().with_codec(UnwritableCodec::default()),
        )
        .unwrap();

        assert!(store.is_loaded());
        assert_eq!(store.codec.decode_calls.get(), 1);
        assert_eq!(store.data().unwrap().port, 1);

        std::fs::remove_dir_all(&data).ok();
    }

    #[test]
    fn test_configs_path_occupied_by_file_is_fatal() {
        // Arrange
        let data = temp_data_folder();
        std::fs::create_dir_all(&data).unwrap();
        std::fs::write(data.join("configs"), b"oops").unwrap();
        let sink = Arc::new(RecordingSink::new());

        // Act
        let result = TypedConfigStore::<Settings>::with_default(
            mock_host(&data),
            sink.clone(),
            "main",
            StoreOptions::default(),
        );

        // Assert: the error surfaces, and LoadFinished still reports failure
        assert!(matches!(
            result,
            Err(StoreError::Storage(StorageError::ConfigsPathNotDirectory { .. }))
        ));
        assert_eq!(
            sink.kinds(),
            vec![ConfigEventKind::LoadStarting, ConfigEventKind::LoadFinished]
        );
        assert_eq!(sink.events()[1].success, Some(false));

        std::fs::remove_dir_all(&data).ok();
    }

    #[test]
    fn test_data_mut_requires_loaded_store() {
        let data = temp_data_folder();
        let dir = storage::ensure_configs_dir(&data).unwrap();
        std::fs::write(dir.join("main.yml"), "port: [").unwrap();

        let mut store = TypedConfigStore::<Settings>::with_default(
            mock_host(&data),
            Arc::new(RecordingSink::new()),
            "main",
            StoreOptions::default(),
        )
        .unwrap();

        assert!(!store.is_loaded());
        assert!(matches!(store.data_mut(), Err(StoreError::NotLoaded { id }) if id == "main"));

        std::fs::remove_dir_all(&data).ok();
    }

    #[test]
    fn test_save_template_overwrites_current_data() {
        let data = temp_data_folder();
        let mut store = TypedConfigStore::<Settings>::with_default(
            mock_host(&data),
            Arc::new(RecordingSink::new()),
            "main",
            StoreOptions::default(),
        )
        .unwrap();
        store.data_mut().unwrap().port = 1;

        store.save_template().unwrap();

        assert_eq!(store.data().unwrap(), &Settings::default());
        std::fs::remove_dir_all(&data).ok();
    }

    #[test]
    fn test_debug_output_names_store() {
        let data = temp_data_folder();
        let store = TypedConfigStore::<Settings>::with_default(
            mock_host(&data),
            Arc::new(RecordingSink::new()),
            "main",
            StoreOptions::default(),
        )
        .unwrap();

        let text = format!("{store:?}");
        assert!(text.contains("TypedConfigStore"));
        assert!(text.contains("main"));

        std::fs::remove_dir_all(&data).ok();
    }
}
