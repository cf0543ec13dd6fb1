//! Ports the kernel is built against.
//!
//! Adapters live in their own crates (`confhub-storage` for the disk, `confhub-codec` for
//! formats); tests plug in in-memory doubles.

mod file_system;
mod serialization;

pub use file_system::{FileStream, FileSystemError, FileSystemErrorExt, FileSystemPort};
pub use serialization::{SerializationError, SerializationErrorExt, SerializationPort};
