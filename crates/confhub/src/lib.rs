//! Facade crate for confhub.
//! Re-exports the kernel, its domain types and the stock adapters.
//! Keep this crate thin: it composes other crates, it does not implement lifecycle logic.
//!
//! ## Usage
//! - Open a [`storage::LocalFileSystem`] and pick a codec from [`codec`].
//! - Build a [`ConfigsService`] (one set of files) or a [`ConfigsHub`] (many isolated sets).
//! - Enable the `toml` feature for `codec::TomlSerializer`.

pub use confhub_codec as codec;
pub use confhub_domain as domain;
pub use confhub_kernel as kernel;
pub use confhub_logger as logger;
pub use confhub_storage as storage;

pub use confhub_kernel::{
    BroadcastOptions, Config, ConfigHandle, ConfigsError, ConfigsHub, ConfigsService,
    HubOperation, HubSettings, ServiceSettings, load_settings,
};

/// Everything a typical application needs in scope.
pub mod prelude {
    pub use confhub_codec::JsonSerializer;
    pub use confhub_domain::{
        Capabilities, NamingMetadata, OperationTimeouts, PathSettings, PathsFormatter,
    };
    pub use confhub_kernel::{
        BroadcastOptions, Config, ConfigHandle, ConfigsError, ConfigsHub, ConfigsService,
        HubOperation, ServiceSettings,
    };
    pub use confhub_storage::LocalFileSystem;
}
