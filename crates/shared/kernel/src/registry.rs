//! Type-erased storage of registered configs.

use crate::config::{Config, ConfigHandle, Document, overlay};
use async_trait::async_trait;
use confhub_domain::{Capabilities, NamingMetadata, PathSettings, resolve_relative_path};
use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Object-safe view of a [`ConfigHandle`] used by the untyped lifecycle operations.
#[async_trait]
pub(crate) trait ConfigSlot: Send + Sync {
    /// Encodes the instance, running the pre-serialize hook first when asked to.
    async fn encode(&self, before_hook: bool) -> Result<Document, serde_json::Error>;

    /// Overlays `document` onto the instance through [`Config::populate_from`].
    ///
    /// On error the instance is left untouched.
    async fn populate(&self, document: Document, after_hook: bool)
    -> Result<(), serde_json::Error>;

    async fn check(&self) -> Result<(), Cow<'static, str>>;

    fn handle(&self) -> &(dyn Any + Send + Sync);
}

struct TypedSlot<T> {
    handle: ConfigHandle<T>,
}

#[async_trait]
impl<T: Config> ConfigSlot for TypedSlot<T> {
    async fn encode(&self, before_hook: bool) -> Result<Document, serde_json::Error> {
        if before_hook {
            let mut value = self.handle.write().await;
            value.on_before_serialize();
            serde_json::to_value(&*value)
        } else {
            serde_json::to_value(&*self.handle.read().await)
        }
    }

    async fn populate(
        &self,
        document: Document,
        after_hook: bool,
    ) -> Result<(), serde_json::Error> {
        let mut value = self.handle.write().await;
        let current = serde_json::to_value(&*value)?;
        let loaded: T = serde_json::from_value(overlay(current, document))?;
        value.populate_from(loaded);
        if after_hook {
            value.on_after_deserialize();
        }
        Ok(())
    }

    async fn check(&self) -> Result<(), Cow<'static, str>> {
        self.handle.read().await.check_data_correctness().await
    }

    fn handle(&self) -> &(dyn Any + Send + Sync) {
        &self.handle
    }
}

/// One registry row.
#[derive(Clone)]
pub(crate) struct Entry {
    pub(crate) slot: Arc<dyn ConfigSlot>,
    pub(crate) type_name: &'static str,
    pub(crate) naming: NamingMetadata,
    pub(crate) capabilities: Capabilities,
    pub(crate) path_override: Option<PathSettings>,
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("type_name", &self.type_name)
            .field("capabilities", &self.capabilities)
            .field("path_override", &self.path_override)
            .finish_non_exhaustive()
    }
}

impl Entry {
    pub(crate) fn from_handle<T: Config>(
        handle: ConfigHandle<T>,
        path_override: Option<PathSettings>,
    ) -> Self {
        Self {
            slot: Arc::new(TypedSlot { handle }),
            type_name: std::any::type_name::<T>(),
            naming: T::naming(),
            capabilities: T::CAPABILITIES,
            path_override: path_override.filter(|p| !p.is_empty()),
        }
    }

    pub(crate) fn handle<T: Config>(&self) -> Option<ConfigHandle<T>> {
        self.slot.handle().downcast_ref::<ConfigHandle<T>>().cloned()
    }

    /// Relative path of the file, before the common and application directories are applied.
    pub(crate) fn relative_path(&self) -> PathBuf {
        resolve_relative_path(self.type_name, &self.naming, self.path_override.as_ref())
    }
}
