//! # Domain Models
//!
//! Pure types shared by the lifecycle manager and the orchestration hub.
//! Keep it lean: no I/O and no async, just data, validation and the path naming policy.

pub mod capabilities;
pub mod error;
pub mod formatter;
pub mod naming;
pub mod path;
pub mod timeouts;

pub use capabilities::Capabilities;
pub use error::{PathError, PathErrorExt};
pub use formatter::PathsFormatter;
pub use naming::{NamingMetadata, default_file_name, resolve_relative_path, short_type_name};
pub use path::PathSettings;
pub use timeouts::OperationTimeouts;
