//! The config lifecycle manager.
//!
//! A [`ConfigsService`] owns one live instance per registered config type and binds it to a
//! file resolved as `<application dir>/<common dir>/<relative path>`. The relative path comes
//! from the naming policy in [`confhub_domain::naming`].
//!
//! Every file operation is bounded by a time budget derived from [`OperationTimeouts`]. When
//! the budget runs out the in-flight work is dropped and [`ConfigsError::OperationTimeout`] is
//! returned; writes already committed by the file system stay committed.

pub use crate::builder::ConfigsServiceBuilder;

use crate::config::{Config, ConfigHandle};
use crate::error::{ConfigsError, ConfigsErrorExt};
use crate::ports::{FileStream, FileSystemPort, SerializationPort};
use crate::registry::{ConfigSlot, Entry};
use crate::settings::ServiceSettings;
use confhub_domain::path::check_directory_path;
use confhub_domain::{Capabilities, OperationTimeouts, PathSettings};
use indexmap::IndexMap;
use indexmap::map::Entry as MapEntry;
use parking_lot::RwLock;
use std::borrow::Cow;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug)]
struct ServiceInner {
    registry: RwLock<IndexMap<Arc<str>, Entry>>,
    common_directory: RwLock<Option<PathBuf>>,
    timeouts: RwLock<OperationTimeouts>,
    file_system: Arc<dyn FileSystemPort>,
    serializer: Arc<dyn SerializationPort>,
}

/// Registry of typed config instances and the lifecycle operations on their files.
///
/// The handle is reference-counted; clones share the registry.
///
/// # Invariants
/// - An identifier is registered at most once.
/// - The instance behind an identifier is created once, by the registration factory, and is
///   afterwards only updated in place.
/// - A failed load never leaves a partially updated instance behind.
#[derive(Debug, Clone)]
pub struct ConfigsService {
    inner: Arc<ServiceInner>,
}

/// Everything a lifecycle operation needs, captured so no registry lock is held across awaits.
struct Target {
    id: Arc<str>,
    slot: Arc<dyn ConfigSlot>,
    path: PathBuf,
    capabilities: Capabilities,
}

impl Target {
    const fn has(&self, capability: Capabilities) -> bool {
        self.capabilities.contains(capability)
    }

    fn label(&self) -> String {
        format!("config `{}` at {}", self.id, self.path.display())
    }
}

impl ConfigsService {
    #[must_use = "The service is not created until you call .build()"]
    pub fn builder() -> ConfigsServiceBuilder {
        ConfigsServiceBuilder::default()
    }

    pub(crate) fn new(
        file_system: Arc<dyn FileSystemPort>,
        serializer: Arc<dyn SerializationPort>,
        timeouts: OperationTimeouts,
    ) -> Self {
        Self {
            inner: Arc::new(ServiceInner {
                registry: RwLock::new(IndexMap::new()),
                common_directory: RwLock::new(None),
                timeouts: RwLock::new(timeouts),
                file_system,
                serializer,
            }),
        }
    }

    /// Builds a service from loaded [`ServiceSettings`].
    ///
    /// # Errors
    /// Returns [`ConfigsError::InvalidPath`] if the configured common directory is malformed.
    pub fn from_settings(
        settings: &ServiceSettings,
        file_system: Arc<dyn FileSystemPort>,
        serializer: Arc<dyn SerializationPort>,
    ) -> Result<Self, ConfigsError> {
        let service = Self::new(file_system, serializer, settings.timeouts);
        service.set_common_directory(settings.common_directory.as_deref())?;
        Ok(service)
    }

    /// Identifier [`ConfigsService::register`] uses for `T`.
    #[must_use]
    pub fn id_of<T: Config>() -> &'static str {
        std::any::type_name::<T>()
    }

    /// `true` when both handles share one registry.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    #[must_use]
    pub fn file_system(&self) -> &Arc<dyn FileSystemPort> {
        &self.inner.file_system
    }

    #[must_use]
    pub fn serializer(&self) -> &Arc<dyn SerializationPort> {
        &self.inner.serializer
    }

    #[must_use]
    pub fn common_directory(&self) -> Option<PathBuf> {
        self.inner.common_directory.read().clone()
    }

    /// Sets or clears the directory all config files are placed under.
    ///
    /// # Errors
    /// Returns [`ConfigsError::InvalidPath`] if the directory is rooted, has an extension or
    /// contains invalid characters. The previous value is kept on error.
    pub fn set_common_directory(&self, directory: Option<&str>) -> Result<(), ConfigsError> {
        let directory = match directory.filter(|dir| !dir.is_empty()) {
            Some(dir) => {
                check_directory_path(dir)?;
                Some(PathBuf::from(dir))
            },
            None => None,
        };
        *self.inner.common_directory.write() = directory;
        Ok(())
    }

    /// Directory already validated by a [`PathsFormatter`](confhub_domain::PathsFormatter).
    pub(crate) fn set_formatted_directory(&self, directory: PathBuf) {
        *self.inner.common_directory.write() = Some(directory);
    }

    #[must_use]
    pub fn timeouts(&self) -> OperationTimeouts {
        *self.inner.timeouts.read()
    }

    pub fn set_timeouts(&self, timeouts: OperationTimeouts) {
        *self.inner.timeouts.write() = timeouts;
    }

    // --- Registration -------------------------------------------------------------------------

    /// Registers `T` under `id`, creating its instance with `factory`.
    ///
    /// `factory` runs once, after the identifier has been checked and outside any lock.
    ///
    /// # Errors
    /// - [`ConfigsError::InvalidIdentifier`] if `id` is blank.
    /// - [`ConfigsError::DuplicateRegistration`] if `id` is taken.
    /// - [`ConfigsError::InvalidPath`] if the type's naming metadata is malformed.
    pub fn register_type<T: Config>(
        &self,
        id: &str,
        factory: impl FnOnce() -> T,
        path_override: Option<PathSettings>,
    ) -> Result<ConfigHandle<T>, ConfigsError> {
        if id.trim().is_empty() {
            return Err(ConfigsError::InvalidIdentifier {
                message: "identifier must not be blank".into(),
                context: None,
            });
        }
        if self.contains_config(id) {
            return Err(duplicate(id));
        }
        T::naming().validate().context(format!("Naming metadata of `{id}`"))?;

        let handle = ConfigHandle::new(factory());
        let entry = Entry::from_handle(handle.clone(), path_override);

        match self.inner.registry.write().entry(Arc::from(id)) {
            MapEntry::Occupied(_) => return Err(duplicate(id)),
            MapEntry::Vacant(slot) => {
                slot.insert(entry);
            },
        }

        info!(id, type_name = std::any::type_name::<T>(), "Config type registered");
        Ok(handle)
    }

    /// Registers `T` under [`ConfigsService::id_of`] with its [`Default`] value.
    ///
    /// # Errors
    /// See [`ConfigsService::register_type`].
    pub fn register<T: Config + Default>(&self) -> Result<ConfigHandle<T>, ConfigsError> {
        self.register_type(Self::id_of::<T>(), T::default, None)
    }

    /// Removes a registration. Files on disk are left alone.
    ///
    /// # Errors
    /// Returns [`ConfigsError::UnknownType`] if `id` is not registered.
    pub fn unregister_type(&self, id: &str) -> Result<(), ConfigsError> {
        if self.inner.registry.write().shift_remove(id).is_none() {
            return Err(ConfigsError::unknown_type(id));
        }
        debug!(id, "Config type unregistered");
        Ok(())
    }

    /// Live instance registered under `id`.
    ///
    /// # Errors
    /// - [`ConfigsError::UnknownType`] if `id` is not registered.
    /// - [`ConfigsError::TypeMismatch`] if it was registered with another type.
    pub fn get_config<T: Config>(&self, id: &str) -> Result<ConfigHandle<T>, ConfigsError> {
        let registry = self.inner.registry.read();
        let entry = registry.get(id).ok_or_else(|| ConfigsError::unknown_type(id))?;
        entry.handle::<T>().ok_or_else(|| ConfigsError::TypeMismatch {
            id: id.to_owned().into(),
            registered: entry.type_name,
            requested: std::any::type_name::<T>(),
            context: None,
        })
    }

    #[must_use]
    pub fn contains_config(&self, id: &str) -> bool {
        self.inner.registry.read().contains_key(id)
    }

    /// Identifiers in registration order.
    #[must_use]
    pub fn registered_ids(&self) -> Vec<Arc<str>> {
        self.inner.registry.read().keys().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.registry.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.registry.read().is_empty()
    }

    // --- Path overrides -----------------------------------------------------------------------

    /// Replaces the path override of a registered config. An empty override clears it.
    ///
    /// # Errors
    /// Returns [`ConfigsError::UnknownType`] if `id` is not registered.
    pub fn set_path_override(&self, id: &str, settings: PathSettings) -> Result<(), ConfigsError> {
        self.with_entry_mut(id, |entry| {
            entry.path_override = Some(settings).filter(|s| !s.is_empty());
        })
    }

    /// # Errors
    /// Returns [`ConfigsError::UnknownType`] if `id` is not registered.
    pub fn clear_path_override(&self, id: &str) -> Result<(), ConfigsError> {
        self.with_entry_mut(id, |entry| entry.path_override = None)
    }

    /// # Errors
    /// Returns [`ConfigsError::UnknownType`] if `id` is not registered.
    pub fn path_override(&self, id: &str) -> Result<Option<PathSettings>, ConfigsError> {
        self.with_entry(id, |entry| entry.path_override.clone())
    }

    /// # Errors
    /// Returns [`ConfigsError::UnknownType`] if `id` is not registered.
    pub fn has_path_override(&self, id: &str) -> Result<bool, ConfigsError> {
        self.with_entry(id, |entry| entry.path_override.is_some())
    }

    /// Full path the file of `id` is read from and written to.
    ///
    /// # Errors
    /// Returns [`ConfigsError::UnknownType`] if `id` is not registered.
    pub fn resolve_file_path(&self, id: &str) -> Result<PathBuf, ConfigsError> {
        self.target(id).map(|target| target.path)
    }

    // --- Lifecycle ----------------------------------------------------------------------------

    /// Writes the current instance to its file unless the file already exists.
    ///
    /// # Errors
    /// [`ConfigsError::UnknownType`], [`ConfigsError::OperationTimeout`], or a port failure.
    pub async fn create_config_file(&self, id: &str) -> Result<(), ConfigsError> {
        let target = self.target(id)?;
        let budget = self.timeouts().create_budget();
        Self::bounded("create", &target, budget, self.create_file(&target)).await
    }

    /// Writes the current instance to its file, replacing any previous content.
    ///
    /// With `check_correctness` set and the capability declared, an invalid instance is
    /// rejected before anything is written.
    ///
    /// # Errors
    /// [`ConfigsError::ConfigDataInvalid`], [`ConfigsError::OperationTimeout`], or a port failure.
    pub async fn save_config_to_file(
        &self,
        id: &str,
        check_correctness: bool,
    ) -> Result<(), ConfigsError> {
        let target = self.target(id)?;
        let budget = self.timeouts().save_budget(check_correctness);
        Self::bounded("save", &target, budget, self.save_file(&target, check_correctness)).await
    }

    /// Reads the file and overlays it onto the live instance.
    ///
    /// # Errors
    /// - [`ConfigsError::FileNotFound`] if the file is missing; the instance is untouched.
    /// - [`ConfigsError::Document`] if the decoded content does not fit the type.
    /// - [`ConfigsError::ConfigDataInvalid`] if the check is requested and fails.
    pub async fn load_config_from_file(
        &self,
        id: &str,
        check_correctness: bool,
    ) -> Result<(), ConfigsError> {
        let target = self.target(id)?;
        let budget = self.timeouts().load_budget(check_correctness);
        Self::bounded("load", &target, budget, self.load_file(&target, check_correctness)).await
    }

    /// Deletes the file if present.
    ///
    /// # Errors
    /// [`ConfigsError::UnknownType`], [`ConfigsError::OperationTimeout`], or a port failure.
    pub async fn delete_config_file(&self, id: &str) -> Result<(), ConfigsError> {
        let target = self.target(id)?;
        let budget = self.timeouts().delete_budget();
        Self::bounded("delete", &target, budget, self.delete_file(&target)).await
    }

    /// Runs the instance's correctness check if it declares one.
    ///
    /// # Errors
    /// [`ConfigsError::ConfigDataInvalid`] or [`ConfigsError::OperationTimeout`].
    pub async fn check_data_correctness(&self, id: &str) -> Result<(), ConfigsError> {
        let target = self.target(id)?;
        let budget = self.timeouts().check_budget();
        Self::bounded("check", &target, budget, Self::check(&target)).await
    }

    /// Creates the file if missing, then loads it.
    ///
    /// # Errors
    /// Any error of [`create_config_file`](Self::create_config_file) or
    /// [`load_config_from_file`](Self::load_config_from_file).
    pub async fn initialize_config(
        &self,
        id: &str,
        check_correctness: bool,
    ) -> Result<(), ConfigsError> {
        let target = self.target(id)?;
        let budget = self.timeouts().initialize_budget(check_correctness);
        let work = async {
            self.create_file(&target).await?;
            self.load_file(&target, check_correctness).await
        };
        Self::bounded("initialize", &target, budget, work).await
    }

    // --- Bulk ---------------------------------------------------------------------------------

    /// # Errors
    /// Stops at, and returns, the first failure in registration order.
    pub async fn create_all_config_files(&self) -> Result<(), ConfigsError> {
        for id in self.registered_ids() {
            self.create_config_file(&id).await?;
        }
        Ok(())
    }

    /// # Errors
    /// Stops at, and returns, the first failure in registration order.
    pub async fn save_all_configs_to_files(
        &self,
        check_correctness: bool,
    ) -> Result<(), ConfigsError> {
        for id in self.registered_ids() {
            self.save_config_to_file(&id, check_correctness).await?;
        }
        Ok(())
    }

    /// # Errors
    /// Stops at, and returns, the first failure in registration order.
    pub async fn load_all_configs_from_files(
        &self,
        check_correctness: bool,
    ) -> Result<(), ConfigsError> {
        for id in self.registered_ids() {
            self.load_config_from_file(&id, check_correctness).await?;
        }
        Ok(())
    }

    /// # Errors
    /// Stops at, and returns, the first failure in registration order.
    pub async fn delete_all_config_files(&self) -> Result<(), ConfigsError> {
        for id in self.registered_ids() {
            self.delete_config_file(&id).await?;
        }
        Ok(())
    }

    /// # Errors
    /// Stops at, and returns, the first failure in registration order.
    pub async fn check_all_configs_data_correctness(&self) -> Result<(), ConfigsError> {
        for id in self.registered_ids() {
            self.check_data_correctness(&id).await?;
        }
        Ok(())
    }

    /// # Errors
    /// Stops at, and returns, the first failure in registration order.
    pub async fn initialize_all_configs(&self, check_correctness: bool) -> Result<(), ConfigsError> {
        for id in self.registered_ids() {
            self.initialize_config(&id, check_correctness).await?;
        }
        Ok(())
    }

    // --- Steps --------------------------------------------------------------------------------

    async fn create_file(&self, target: &Target) -> Result<(), ConfigsError> {
        let fs = &self.inner.file_system;
        fs.create_directories_along_path(&target.path).await.context(target.label())?;

        if fs.exists(&target.path).await.context(target.label())? {
            debug!(id = %target.id, path = %target.path.display(), "Config file already exists");
            return Ok(());
        }

        let bytes = self.encode(target).await?;
        let stream = fs.create(&target.path).await.context(target.label())?;
        Self::write(target, stream, &bytes).await?;

        debug!(id = %target.id, path = %target.path.display(), "Config file created");
        Ok(())
    }

    async fn save_file(&self, target: &Target, check_correctness: bool) -> Result<(), ConfigsError> {
        if check_correctness {
            Self::check(target).await?;
        }

        let bytes = self.encode(target).await?;
        let fs = &self.inner.file_system;
        let stream = if fs.exists(&target.path).await.context(target.label())? {
            fs.open_for_overwrite(&target.path).await.context(target.label())?
        } else {
            fs.create_directories_along_path(&target.path).await.context(target.label())?;
            fs.create(&target.path).await.context(target.label())?
        };
        Self::write(target, stream, &bytes).await?;

        debug!(id = %target.id, path = %target.path.display(), "Config saved");
        Ok(())
    }

    async fn load_file(&self, target: &Target, check_correctness: bool) -> Result<(), ConfigsError> {
        let fs = &self.inner.file_system;
        if !fs.exists(&target.path).await.context(target.label())? {
            return Err(ConfigsError::FileNotFound {
                id: target.id.to_string().into(),
                path: target.path.display().to_string().into(),
                context: None,
            });
        }

        let bytes = fs.read_all_bytes(&target.path).await.context(target.label())?;
        let document = self.inner.serializer.deserialize(&bytes).await.context(target.label())?;
        target
            .slot
            .populate(document, target.has(Capabilities::AFTER_DESERIALIZE))
            .await
            .context(target.label())?;

        if check_correctness {
            Self::check(target).await?;
        }

        debug!(id = %target.id, path = %target.path.display(), "Config loaded");
        Ok(())
    }

    async fn delete_file(&self, target: &Target) -> Result<(), ConfigsError> {
        let fs = &self.inner.file_system;
        if fs.exists(&target.path).await.context(target.label())? {
            fs.delete(&target.path).await.context(target.label())?;
            debug!(id = %target.id, path = %target.path.display(), "Config file deleted");
        }
        Ok(())
    }

    async fn check(target: &Target) -> Result<(), ConfigsError> {
        if !target.has(Capabilities::CHECK_CORRECTNESS) {
            return Ok(());
        }
        target.slot.check().await.map_err(|message| ConfigsError::ConfigDataInvalid {
            id: target.id.to_string().into(),
            message,
            context: None,
        })
    }

    async fn encode(&self, target: &Target) -> Result<Vec<u8>, ConfigsError> {
        let document = target
            .slot
            .encode(target.has(Capabilities::BEFORE_SERIALIZE))
            .await
            .context(target.label())?;
        self.inner.serializer.serialize(&document).await.context(target.label())
    }

    async fn write(
        target: &Target,
        mut stream: Box<dyn FileStream>,
        bytes: &[u8],
    ) -> Result<(), ConfigsError> {
        stream.write_all(bytes).await.context(target.label())?;
        stream.commit().await.context(target.label())
    }

    async fn bounded<T>(
        operation: &'static str,
        target: &Target,
        budget: Duration,
        work: impl Future<Output = Result<T, ConfigsError>>,
    ) -> Result<T, ConfigsError> {
        if let Ok(result) = tokio::time::timeout(budget, work).await {
            result
        } else {
            warn!(id = %target.id, operation, ?budget, "Config operation timed out");
            Err(ConfigsError::OperationTimeout {
                operation,
                id: target.id.to_string().into(),
                timeout: budget,
                context: None,
            })
        }
    }

    // --- Registry access ----------------------------------------------------------------------

    fn target(&self, id: &str) -> Result<Target, ConfigsError> {
        let registry = self.inner.registry.read();
        let (key, entry) =
            registry.get_key_value(id).ok_or_else(|| ConfigsError::unknown_type(id))?;

        let mut path = self.inner.file_system.application_directory().to_path_buf();
        if let Some(common) = self.inner.common_directory.read().as_ref() {
            path.push(common);
        }
        path.push(entry.relative_path());

        Ok(Target {
            id: Arc::clone(key),
            slot: Arc::clone(&entry.slot),
            path,
            capabilities: entry.capabilities,
        })
    }

    fn with_entry<R>(&self, id: &str, f: impl FnOnce(&Entry) -> R) -> Result<R, ConfigsError> {
        self.inner.registry.read().get(id).map(f).ok_or_else(|| ConfigsError::unknown_type(id))
    }

    fn with_entry_mut<R>(
        &self,
        id: &str,
        f: impl FnOnce(&mut Entry) -> R,
    ) -> Result<R, ConfigsError> {
        self.inner.registry.write().get_mut(id).map(f).ok_or_else(|| ConfigsError::unknown_type(id))
    }
}

fn duplicate(id: &str) -> ConfigsError {
    ConfigsError::DuplicateRegistration { id: Cow::Owned(id.to_owned()), context: None }
}
