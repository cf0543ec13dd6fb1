use crate::error::{ConfigsError, ConfigsErrorExt};
use crate::ports::{FileSystemPort, SerializationPort};
use crate::service::ConfigsService;
use confhub_domain::OperationTimeouts;
use private::Sealed;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct NoFileSystem;
#[derive(Debug)]
pub struct WithFileSystem(Arc<dyn FileSystemPort>);

#[derive(Debug, Default)]
pub struct NoSerializer;
#[derive(Debug)]
pub struct WithSerializer(Arc<dyn SerializationPort>);

mod private {
    pub(super) trait Sealed {}
}
impl Sealed for NoFileSystem {}
impl Sealed for WithFileSystem {}
impl Sealed for NoSerializer {}
impl Sealed for WithSerializer {}

/// Fluent builder for [`ConfigsService`]; both ports are required before [`build`] is
/// available.
///
/// [`build`]: ConfigsServiceBuilder::build
#[allow(private_bounds)]
#[derive(Debug, Default)]
pub struct ConfigsServiceBuilder<F: Sealed = NoFileSystem, S: Sealed = NoSerializer> {
    file_system: F,
    serializer: S,
    common_directory: Option<String>,
    timeouts: OperationTimeouts,
}

#[allow(private_bounds)]
impl<F: Sealed, S: Sealed> ConfigsServiceBuilder<F, S> {
    #[must_use = "Sets the directory, relative to the application directory, all files live under"]
    pub fn common_directory(mut self, directory: impl Into<String>) -> Self {
        self.common_directory = Some(directory.into());
        self
    }

    #[must_use = "Sets the per-step time budgets"]
    pub const fn timeouts(mut self, timeouts: OperationTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }
}

#[allow(private_bounds)]
impl<S: Sealed> ConfigsServiceBuilder<NoFileSystem, S> {
    #[must_use = "Sets the file system port"]
    pub fn file_system(
        self,
        port: Arc<dyn FileSystemPort>,
    ) -> ConfigsServiceBuilder<WithFileSystem, S> {
        ConfigsServiceBuilder {
            file_system: WithFileSystem(port),
            serializer: self.serializer,
            common_directory: self.common_directory,
            timeouts: self.timeouts,
        }
    }
}

#[allow(private_bounds)]
impl<F: Sealed> ConfigsServiceBuilder<F, NoSerializer> {
    #[must_use = "Sets the serialization port"]
    pub fn serializer(
        self,
        port: Arc<dyn SerializationPort>,
    ) -> ConfigsServiceBuilder<F, WithSerializer> {
        ConfigsServiceBuilder {
            file_system: self.file_system,
            serializer: WithSerializer(port),
            common_directory: self.common_directory,
            timeouts: self.timeouts,
        }
    }
}

impl ConfigsServiceBuilder<WithFileSystem, WithSerializer> {
    /// Validates the common directory and returns an empty service.
    ///
    /// # Errors
    /// Returns [`ConfigsError::InvalidPath`] if the common directory is malformed.
    pub fn build(self) -> Result<ConfigsService, ConfigsError> {
        let service = ConfigsService::new(self.file_system.0, self.serializer.0, self.timeouts);
        service
            .set_common_directory(self.common_directory.as_deref())
            .context("Failed to build configs service")?;
        Ok(service)
    }
}
