//! Layered settings for services and hubs.

use crate::error::{ConfigsError, ConfigsErrorExt};
use confhub_domain::OperationTimeouts;
use confhub_domain::timeouts::millis;
use ::config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Prefix of environment overrides, e.g. `CONFHUB__HUB__SHARDS=3`.
pub const ENV_PREFIX: &str = "CONFHUB";

/// Settings of a standalone [`ConfigsService`](crate::ConfigsService), plus an optional hub
/// section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    pub common_directory: Option<String>,
    pub timeouts: OperationTimeouts,
    pub hub: HubSettings,
}

/// Settings of a [`ConfigsHub`](crate::ConfigsHub).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubSettings {
    pub common_directory: Option<String>,
    pub subdirectory_format: String,
    /// Shards created when the hub is built.
    pub shards: usize,
    #[serde(with = "millis", rename = "broadcast_timeout_ms")]
    pub broadcast_timeout: Duration,
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            common_directory: None,
            subdirectory_format: "{id}".to_owned(),
            shards: 0,
            broadcast_timeout: Duration::from_millis(5000),
        }
    }
}

/// Loads settings from an optional file overlaid with `CONFHUB__*` environment variables.
///
/// Nested fields are reached with double underscores: `CONFHUB__TIMEOUTS__SERIALIZE_MS`
/// maps to `timeouts.serialize_ms`. The file format is picked from its extension.
///
/// # Errors
/// Returns [`ConfigsError::Settings`] if an explicitly named file is missing or the merged
/// sources do not match `T`.
///
/// # Example
/// ```rust
/// use confhub_kernel::{ServiceSettings, load_settings};
///
/// let settings: ServiceSettings = load_settings(None::<&str>).unwrap_or_default();
/// assert_eq!(settings.hub.subdirectory_format, "{id}");
/// ```
pub fn load_settings<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigsError>
where
    T: DeserializeOwned,
{
    let mut builder = Config::builder();

    if let Some(path) = path {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading settings");
        builder = builder.add_source(File::from(path).required(true));
    }

    builder
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .convert_case(::config::Case::Snake),
        )
        .build()
        .context("Failed to build settings")?
        .try_deserialize::<T>()
        .context("Failed to deserialize settings")
}
