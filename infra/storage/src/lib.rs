//! Local disk adapter for the config kernel.
//!
//! [`LocalFileSystem`] implements [`confhub_kernel::FileSystemPort`] on top of `tokio::fs`
//! with the guarantees a config file needs:
//!
//! - **Sandbox Security**: strict path traversal protection using physical path canonicalization.
//! - **Atomic Writes**: unique temp write + `fsync` + `rename`, so a crash mid-save never leaves a
//!   half-written config and an overwrite never keeps stale trailing bytes.
//! - **Self-Healing**: orphaned temp files are cleaned up when the file system is opened.
//!
//! ```rust
//! use confhub_storage::{LocalFileSystem, StorageError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), StorageError> {
//!     # let tmp = tempfile::tempdir().unwrap();
//!     # let root = tmp.path().join("app");
//!     let fs = LocalFileSystem::builder().root(&root).create(true).connect().await?;
//!     assert!(fs.resolve("../outside.cfg").await.is_err());
//!     Ok(())
//! }
//! ```

mod builder;
mod error;
mod local;
mod maintenance;
mod security;

pub use builder::LocalFileSystemBuilder;
pub use error::{StorageError, StorageErrorExt};
pub use local::LocalFileSystem;
