//! Serialization ports for the config kernel.
//!
//! - [`JsonSerializer`]: indented UTF-8 JSON, the default on-disk format.
//! - `TomlSerializer` (feature `toml`): TOML documents for hand-edited configs.
//!
//! Both only convert between bytes and [`confhub_kernel::Document`]; merging into typed
//! instances stays in the kernel.

mod json;
#[cfg(feature = "toml")]
mod toml_codec;

pub use json::JsonSerializer;
#[cfg(feature = "toml")]
pub use toml_codec::TomlSerializer;
