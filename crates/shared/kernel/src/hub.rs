//! Multi-instance orchestration.
//!
//! A [`ConfigsHub`] manages an ordered list of [`ConfigsService`] shards. Each shard gets a
//! creation id that never changes and is never reused; the id is what `{id}` expands to in
//! the shard's directory and in per-registration file-name templates, so removing a shard
//! never moves the files of the others.
//!
//! ```text
//! <app dir>/<hub common dir>/<subdirectory_format with {id}>/<file name template with {id}>
//! ```

use crate::config::{Config, ConfigHandle};
use crate::error::{ConfigsError, ConfigsErrorExt};
use crate::ports::{FileSystemPort, SerializationPort};
use crate::service::ConfigsService;
use crate::settings::ServiceSettings;
use confhub_domain::{OperationTimeouts, PathSettings, PathsFormatter, default_file_name};
use futures::future::try_join_all;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{Instrument, debug, info, info_span, warn};

const DEFAULT_BROADCAST_TIMEOUT: Duration = Duration::from_millis(5000);

/// Lifecycle operation applied to one config type on every shard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HubOperation {
    Initialize { check_correctness: bool },
    Create,
    Save { check_correctness: bool },
    Load { check_correctness: bool },
    Delete,
    CheckCorrectness,
}

impl HubOperation {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Initialize { .. } => "initialize",
            Self::Create => "create",
            Self::Save { .. } => "save",
            Self::Load { .. } => "load",
            Self::Delete => "delete",
            Self::CheckCorrectness => "check",
        }
    }

    async fn apply(self, service: &ConfigsService, id: &str) -> Result<(), ConfigsError> {
        match self {
            Self::Initialize { check_correctness } => {
                service.initialize_config(id, check_correctness).await
            },
            Self::Create => service.create_config_file(id).await,
            Self::Save { check_correctness } => {
                service.save_config_to_file(id, check_correctness).await
            },
            Self::Load { check_correctness } => {
                service.load_config_from_file(id, check_correctness).await
            },
            Self::Delete => service.delete_config_file(id).await,
            Self::CheckCorrectness => service.check_data_correctness(id).await,
        }
    }
}

impl fmt::Display for HubOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a broadcast runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastOptions {
    /// Run all shards concurrently instead of one after another.
    pub parallel: bool,
    /// Budget for the whole broadcast.
    pub timeout: Duration,
}

impl Default for BroadcastOptions {
    fn default() -> Self {
        Self { parallel: false, timeout: DEFAULT_BROADCAST_TIMEOUT }
    }
}

impl BroadcastOptions {
    #[must_use]
    pub fn sequential() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn parallel() -> Self {
        Self { parallel: true, ..Self::default() }
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Clone)]
struct Shard {
    id: usize,
    service: ConfigsService,
}

impl Shard {
    fn label(&self) -> String {
        format!("shard {}", self.id)
    }
}

/// Ordered set of [`ConfigsService`] shards sharing one naming scheme.
#[derive(Debug)]
pub struct ConfigsHub {
    file_system: Arc<dyn FileSystemPort>,
    serializer: Arc<dyn SerializationPort>,
    formatter: PathsFormatter,
    timeouts: OperationTimeouts,
    broadcast_timeout: Duration,
    shards: RwLock<Vec<Shard>>,
    next_id: AtomicUsize,
}

impl ConfigsHub {
    #[must_use]
    pub fn new(
        file_system: Arc<dyn FileSystemPort>,
        serializer: Arc<dyn SerializationPort>,
        formatter: PathsFormatter,
    ) -> Self {
        Self {
            file_system,
            serializer,
            formatter,
            timeouts: OperationTimeouts::default(),
            broadcast_timeout: DEFAULT_BROADCAST_TIMEOUT,
            shards: RwLock::new(Vec::new()),
            next_id: AtomicUsize::new(0),
        }
    }

    /// Step budgets handed to shards created from now on.
    #[must_use]
    pub const fn with_timeouts(mut self, timeouts: OperationTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Budget of the `*_for_all` conveniences.
    #[must_use]
    pub const fn with_broadcast_timeout(mut self, timeout: Duration) -> Self {
        self.broadcast_timeout = timeout;
        self
    }

    /// Builds a hub from the `hub` section of [`ServiceSettings`] and creates its initial shards.
    ///
    /// # Errors
    /// Returns [`ConfigsError::InvalidPath`] if the common directory or subdirectory format is
    /// malformed.
    pub fn from_settings(
        settings: &ServiceSettings,
        file_system: Arc<dyn FileSystemPort>,
        serializer: Arc<dyn SerializationPort>,
    ) -> Result<Self, ConfigsError> {
        let hub_settings = &settings.hub;
        let formatter = PathsFormatter::new(
            hub_settings.common_directory.as_deref(),
            hub_settings.subdirectory_format.clone(),
        )
        .context("Invalid hub layout")?;

        let hub = Self::new(file_system, serializer, formatter)
            .with_timeouts(settings.timeouts)
            .with_broadcast_timeout(hub_settings.broadcast_timeout);
        for _ in 0..hub_settings.shards {
            hub.add_shard();
        }
        Ok(hub)
    }

    #[must_use]
    pub const fn formatter(&self) -> &PathsFormatter {
        &self.formatter
    }

    #[must_use]
    pub const fn broadcast_timeout(&self) -> Duration {
        self.broadcast_timeout
    }

    // --- Shards -------------------------------------------------------------------------------

    /// Appends a new, empty shard rooted at its formatted subdirectory.
    pub fn add_shard(&self) -> ConfigsService {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let directory = self.formatter.shard_directory(id);

        let service = ConfigsService::new(
            Arc::clone(&self.file_system),
            Arc::clone(&self.serializer),
            self.timeouts,
        );
        service.set_formatted_directory(directory.clone());
        self.shards.write().push(Shard { id, service: service.clone() });

        info!(shard = id, directory = %directory.display(), "Shard added");
        service
    }

    /// Removes the shard behind `service`. Its files stay on disk.
    ///
    /// # Errors
    /// Returns [`ConfigsError::UnknownShard`] if `service` does not belong to this hub.
    pub fn remove_shard(&self, service: &ConfigsService) -> Result<(), ConfigsError> {
        let mut shards = self.shards.write();
        let position = shards
            .iter()
            .position(|shard| shard.service.ptr_eq(service))
            .ok_or_else(|| ConfigsError::unknown_shard("Service is not a shard of this hub"))?;
        let removed = shards.remove(position);
        info!(shard = removed.id, "Shard removed");
        Ok(())
    }

    /// Removes the shard at `index` and returns it.
    ///
    /// # Errors
    /// Returns [`ConfigsError::UnknownShard`] if `index` is out of range.
    pub fn remove_shard_at(&self, index: usize) -> Result<ConfigsService, ConfigsError> {
        let mut shards = self.shards.write();
        if index >= shards.len() {
            return Err(out_of_range(index, shards.len()));
        }
        let removed = shards.remove(index);
        info!(shard = removed.id, "Shard removed");
        Ok(removed.service)
    }

    /// # Errors
    /// Returns [`ConfigsError::UnknownShard`] if `index` is out of range.
    pub fn shard(&self, index: usize) -> Result<ConfigsService, ConfigsError> {
        self.shard_at(index).map(|shard| shard.service)
    }

    /// Creation id of the shard at `index`.
    ///
    /// # Errors
    /// Returns [`ConfigsError::UnknownShard`] if `index` is out of range.
    pub fn shard_id(&self, index: usize) -> Result<usize, ConfigsError> {
        self.shard_at(index).map(|shard| shard.id)
    }

    /// Shards in insertion order.
    #[must_use]
    pub fn shards(&self) -> Vec<ConfigsService> {
        self.shards.read().iter().map(|shard| shard.service.clone()).collect()
    }

    #[must_use]
    pub fn shard_count(&self) -> usize {
        self.shards.read().len()
    }

    // --- Registration -------------------------------------------------------------------------

    /// Registers `T` on one shard with a file name expanded from `file_name_template`.
    ///
    /// `index` is the shard's current position, but `{id}` expands to the id the shard got at
    /// creation (see [`ConfigsHub::shard_id`]). The two differ once an earlier shard has been
    /// removed. `{n}` and `{ex}` expand to the stem and extension of the name the type would get
    /// without an override. The template must contain `{id}`.
    ///
    /// # Errors
    /// - [`ConfigsError::UnknownShard`] if `index` is out of range.
    /// - [`ConfigsError::InvalidPath`] if the template is malformed.
    /// - [`ConfigsError::DuplicateRegistration`] if the shard already has `id`.
    pub fn register_type_on_shard<T: Config>(
        &self,
        index: usize,
        id: &str,
        factory: impl FnOnce() -> T,
        file_name_template: &str,
    ) -> Result<ConfigHandle<T>, ConfigsError> {
        let shard = self.shard_at(index)?;
        Self::register_on(&shard, id, factory, file_name_template)
    }

    /// Registers `T` on every shard that does not have `id` yet.
    ///
    /// `factory` runs once per newly registered shard.
    ///
    /// # Errors
    /// Stops at the first failing shard; shards handled before it stay registered.
    pub fn register_type_on_all_shards<T: Config>(
        &self,
        id: &str,
        factory: impl Fn() -> T,
        file_name_template: &str,
    ) -> Result<(), ConfigsError> {
        let shards = self.shards.read().clone();
        for shard in shards.iter().filter(|shard| !shard.service.contains_config(id)) {
            Self::register_on(shard, id, &factory, file_name_template)?;
        }
        Ok(())
    }

    /// # Errors
    /// [`ConfigsError::UnknownShard`] or [`ConfigsError::UnknownType`].
    pub fn unregister_type_on_shard(&self, index: usize, id: &str) -> Result<(), ConfigsError> {
        let shard = self.shard_at(index)?;
        shard.service.unregister_type(id).context(shard.label())
    }

    /// Removes `id` from every shard that has it and returns how many did.
    pub fn unregister_type_on_all_shards(&self, id: &str) -> usize {
        let shards = self.shards.read().clone();
        shards.iter().filter(|shard| shard.service.unregister_type(id).is_ok()).count()
    }

    /// Instance of `id` on every shard, `None` where the shard lacks it.
    ///
    /// # Errors
    /// Returns [`ConfigsError::TypeMismatch`] if a shard registered `id` with another type.
    pub fn get_instances_of_type<T: Config>(
        &self,
        id: &str,
    ) -> Result<Vec<Option<ConfigHandle<T>>>, ConfigsError> {
        let shards = self.shards.read().clone();
        shards
            .iter()
            .map(|shard| {
                if shard.service.contains_config(id) {
                    shard.service.get_config::<T>(id).map(Some).context(shard.label())
                } else {
                    Ok(None)
                }
            })
            .collect()
    }

    // --- Broadcast ----------------------------------------------------------------------------

    /// Applies `operation` to `id` on every shard present when the call starts.
    ///
    /// Sequential runs go in shard order; parallel runs are polled concurrently. The first
    /// failure is returned and the remaining shard work is dropped. An empty hub succeeds.
    ///
    /// # Errors
    /// - The first shard failure, with the shard id in its context.
    /// - [`ConfigsError::OperationTimeout`] if the whole broadcast exceeds `options.timeout`.
    pub async fn broadcast(
        &self,
        id: &str,
        operation: HubOperation,
        options: BroadcastOptions,
    ) -> Result<(), ConfigsError> {
        let shards = self.shards.read().clone();
        debug!(id, %operation, shards = shards.len(), parallel = options.parallel, "Broadcasting");

        let work = async {
            if options.parallel {
                try_join_all(shards.iter().map(|shard| Self::run_on(shard, id, operation)))
                    .await
                    .map(drop)
            } else {
                for shard in &shards {
                    Self::run_on(shard, id, operation).await?;
                }
                Ok(())
            }
        };

        if let Ok(result) = tokio::time::timeout(options.timeout, work).await {
            result
        } else {
            warn!(id, %operation, timeout = ?options.timeout, "Broadcast timed out");
            Err(ConfigsError::OperationTimeout {
                operation: operation.name(),
                id: id.to_owned().into(),
                timeout: options.timeout,
                context: Some("broadcast".into()),
            })
        }
    }

    /// # Errors
    /// See [`ConfigsHub::broadcast`].
    pub async fn initialize_for_all(
        &self,
        id: &str,
        check_correctness: bool,
        parallel: bool,
    ) -> Result<(), ConfigsError> {
        let operation = HubOperation::Initialize { check_correctness };
        self.broadcast(id, operation, self.options(parallel)).await
    }

    /// # Errors
    /// See [`ConfigsHub::broadcast`].
    pub async fn create_for_all(&self, id: &str, parallel: bool) -> Result<(), ConfigsError> {
        self.broadcast(id, HubOperation::Create, self.options(parallel)).await
    }

    /// # Errors
    /// See [`ConfigsHub::broadcast`].
    pub async fn save_for_all(
        &self,
        id: &str,
        check_correctness: bool,
        parallel: bool,
    ) -> Result<(), ConfigsError> {
        let operation = HubOperation::Save { check_correctness };
        self.broadcast(id, operation, self.options(parallel)).await
    }

    /// # Errors
    /// See [`ConfigsHub::broadcast`].
    pub async fn load_for_all(
        &self,
        id: &str,
        check_correctness: bool,
        parallel: bool,
    ) -> Result<(), ConfigsError> {
        let operation = HubOperation::Load { check_correctness };
        self.broadcast(id, operation, self.options(parallel)).await
    }

    /// # Errors
    /// See [`ConfigsHub::broadcast`].
    pub async fn delete_for_all(&self, id: &str, parallel: bool) -> Result<(), ConfigsError> {
        self.broadcast(id, HubOperation::Delete, self.options(parallel)).await
    }

    /// # Errors
    /// See [`ConfigsHub::broadcast`].
    pub async fn check_correctness_for_all(
        &self,
        id: &str,
        parallel: bool,
    ) -> Result<(), ConfigsError> {
        self.broadcast(id, HubOperation::CheckCorrectness, self.options(parallel)).await
    }

    // --- Internals ----------------------------------------------------------------------------

    const fn options(&self, parallel: bool) -> BroadcastOptions {
        BroadcastOptions { parallel, timeout: self.broadcast_timeout }
    }

    fn shard_at(&self, index: usize) -> Result<Shard, ConfigsError> {
        let shards = self.shards.read();
        shards.get(index).cloned().ok_or_else(|| out_of_range(index, shards.len()))
    }

    fn register_on<T: Config>(
        shard: &Shard,
        id: &str,
        factory: impl FnOnce() -> T,
        file_name_template: &str,
    ) -> Result<ConfigHandle<T>, ConfigsError> {
        let base = T::naming()
            .declared_file_name()
            .map_or_else(|| default_file_name(std::any::type_name::<T>()), str::to_owned);
        let file_name = PathsFormatter::format_file_name(file_name_template, &base, shard.id)
            .context(shard.label())?;
        let settings = PathSettings::with_file_name(&file_name).context(shard.label())?;

        shard.service.register_type(id, factory, Some(settings)).context(shard.label())
    }

    async fn run_on(shard: &Shard, id: &str, operation: HubOperation) -> Result<(), ConfigsError> {
        operation
            .apply(&shard.service, id)
            .instrument(info_span!("shard", id = shard.id))
            .await
            .context(shard.label())
    }
}

fn out_of_range(index: usize, len: usize) -> ConfigsError {
    ConfigsError::unknown_shard(format!("index {index} is out of range for {len} shards"))
}
