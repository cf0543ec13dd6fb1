//! Config lifecycle kernel.
//!
//! Two layers live here:
//! 1. **[`ConfigsService`]**: a registry of typed config instances bound to files, with create,
//!    save, load, delete and correctness checks, each bounded by a time budget.
//! 2. **[`ConfigsHub`]**: an ordered set of services ("shards") that share one naming scheme and
//!    receive broadcast operations sequentially or concurrently.
//!
//! Storage and encoding are reached only through the [`ports`], so the kernel never touches
//! the disk or a concrete format itself.
//!
//! ```rust,ignore
//! use confhub_kernel::{Config, ConfigsService};
//!
//! #[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
//! struct Counter { count: u32 }
//! impl Config for Counter {}
//!
//! # async fn run(fs: std::sync::Arc<dyn confhub_kernel::FileSystemPort>,
//! #              json: std::sync::Arc<dyn confhub_kernel::SerializationPort>)
//! #     -> Result<(), confhub_kernel::ConfigsError> {
//! let service = ConfigsService::builder().file_system(fs).serializer(json).build()?;
//! let counter = service.register::<Counter>()?;
//! service.initialize_config(ConfigsService::id_of::<Counter>(), true).await?;
//! counter.write().await.count += 1;
//! service.save_all_configs_to_files(false).await?;
//! # Ok(())
//! # }
//! ```

mod builder;
pub mod config;
pub mod error;
pub mod hub;
pub mod ports;
mod registry;
pub mod service;
pub mod settings;

pub use config::{Config, ConfigHandle, Document};
pub use error::{ConfigsError, ConfigsErrorExt};
pub use hub::{BroadcastOptions, ConfigsHub, HubOperation};
pub use ports::{
    FileStream, FileSystemError, FileSystemPort, SerializationError, SerializationPort,
};
pub use service::{ConfigsService, ConfigsServiceBuilder};
pub use settings::{HubSettings, ServiceSettings, load_settings};

pub use confhub_domain as domain;
