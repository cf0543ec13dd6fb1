//! The [`Config`] contract and the shared handle to a live instance.

use async_trait::async_trait;
use confhub_domain::{Capabilities, NamingMetadata};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Format-neutral tree a config is encoded to before it reaches a [`SerializationPort`].
///
/// [`SerializationPort`]: crate::SerializationPort
pub type Document = serde_json::Value;

/// A type whose instances are persisted by a [`ConfigsService`](crate::ConfigsService).
///
/// Hooks are opt-in: the manager only calls the ones flagged in [`Config::CAPABILITIES`], and
/// reads the flags once, at registration.
///
/// ```rust
/// use confhub_kernel::Config;
/// use confhub_kernel::domain::{Capabilities, NamingMetadata};
/// use std::borrow::Cow;
///
/// #[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
/// struct Limits {
///     max_connections: u32,
/// }
///
/// #[async_trait::async_trait]
/// impl Config for Limits {
///     const CAPABILITIES: Capabilities = Capabilities::CHECK_CORRECTNESS;
///
///     fn naming() -> NamingMetadata {
///         NamingMetadata::new().file_name("limits.json").directory("net")
///     }
///
///     async fn check_data_correctness(&self) -> Result<(), Cow<'static, str>> {
///         if self.max_connections == 0 {
///             return Err("max_connections must be positive".into());
///         }
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Config: Serialize + DeserializeOwned + Send + Sync + 'static {
    const CAPABILITIES: Capabilities = Capabilities::empty();

    /// Type-level file name and directory used when no path override is set.
    #[must_use]
    fn naming() -> NamingMetadata {
        NamingMetadata::new()
    }

    /// Called right before encoding when [`Capabilities::BEFORE_SERIALIZE`] is set.
    fn on_before_serialize(&mut self) {}

    /// Moves `loaded`, freshly decoded from the file, into the live instance.
    ///
    /// Runs on every successful load, before [`Config::on_after_deserialize`]. The default
    /// replaces the instance wholesale, which resets fields serde never sees (`#[serde(skip)]`
    /// caches, runtime handles) to their decoded defaults. Types holding such state override
    /// it and copy over only the persisted fields.
    ///
    /// ```rust
    /// use confhub_kernel::Config;
    ///
    /// #[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
    /// struct Routes {
    ///     entries: Vec<String>,
    ///     #[serde(skip)]
    ///     lookups: u64,
    /// }
    ///
    /// impl Config for Routes {
    ///     fn populate_from(&mut self, loaded: Self) {
    ///         self.entries = loaded.entries;
    ///     }
    /// }
    /// ```
    fn populate_from(&mut self, loaded: Self) {
        *self = loaded;
    }

    /// Called right after a successful decode when [`Capabilities::AFTER_DESERIALIZE`] is set.
    fn on_after_deserialize(&mut self) {}

    /// Validates the instance when [`Capabilities::CHECK_CORRECTNESS`] is set.
    ///
    /// # Errors
    /// The message is reported as [`ConfigsError::ConfigDataInvalid`](crate::ConfigsError).
    async fn check_data_correctness(&self) -> Result<(), Cow<'static, str>> {
        Ok(())
    }
}

/// Shared handle to the live instance of a registered config.
///
/// Every clone points at the same instance; loads update it in place, so handles obtained
/// before a load observe the new values.
#[derive(Debug, Default)]
pub struct ConfigHandle<T> {
    inner: Arc<RwLock<T>>,
}

impl<T> Clone for ConfigHandle<T> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<T> ConfigHandle<T> {
    pub(crate) fn new(value: T) -> Self {
        Self { inner: Arc::new(RwLock::new(value)) }
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, T> {
        self.inner.read().await
    }

    pub async fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.inner.write().await
    }

    /// `true` when both handles point at the same instance.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: Clone> ConfigHandle<T> {
    /// Copy of the current value.
    pub async fn snapshot(&self) -> T {
        self.inner.read().await.clone()
    }
}

/// Overlays `incoming` onto `current`, one top-level field at a time.
///
/// Fields present in `incoming` replace the current value wholesale, collections included, so
/// a load never appends to in-memory lists. Fields absent from `incoming` keep their current
/// value. Non-object documents replace the whole value.
pub(crate) fn overlay(current: Document, incoming: Document) -> Document {
    match (current, incoming) {
        (Document::Object(mut fields), Document::Object(incoming)) => {
            for (key, value) in incoming {
                fields.insert(key, value);
            }
            Document::Object(fields)
        },
        (_, incoming) => incoming,
    }
}
