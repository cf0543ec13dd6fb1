//! Path naming policy.
//!
//! Resolves the relative file path of a registered config type from two independent sources:
//! caller overrides ([`PathSettings`]) and type-level defaults ([`NamingMetadata`]). Directory
//! and file name are resolved separately, so an override file name combined with a
//! type-level directory is a valid configuration. Nothing here touches the file system.

use crate::error::PathError;
use crate::path::{PathSettings, check_directory_path, check_file_name};
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// Extension used when neither override nor metadata name the file.
pub const DEFAULT_EXTENSION: &str = "cfg";

/// Type-level naming defaults, declared once per config type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamingMetadata {
    file_name: Option<Cow<'static, str>>,
    directory: Option<Cow<'static, str>>,
}

impl NamingMetadata {
    #[must_use]
    pub const fn new() -> Self {
        Self { file_name: None, directory: None }
    }

    /// Declares the file name, extension included.
    #[must_use]
    pub fn file_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    /// Declares the directory relative to the common directory.
    ///
    /// A value that ends in a file name (has an extension) contributes only its parent.
    #[must_use]
    pub fn directory(mut self, directory: impl Into<Cow<'static, str>>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    #[must_use]
    pub fn declared_file_name(&self) -> Option<&str> {
        self.file_name.as_deref().filter(|s| !s.is_empty())
    }

    #[must_use]
    pub fn declared_directory(&self) -> Option<&Path> {
        let raw = self.directory.as_deref().filter(|s| !s.is_empty())?;
        let path = Path::new(raw);
        if path.extension().is_some() {
            path.parent().filter(|p| !p.as_os_str().is_empty())
        } else {
            Some(path)
        }
    }

    /// Checks the declared parts with the same rules as [`PathSettings`].
    ///
    /// # Errors
    /// Returns [`PathError::InvalidPath`] for a malformed name or directory.
    pub fn validate(&self) -> Result<(), PathError> {
        if let Some(name) = self.declared_file_name() {
            check_file_name(name)?;
        }
        if let Some(dir) = self.declared_directory().and_then(Path::to_str) {
            check_directory_path(dir)?;
        }
        Ok(())
    }
}

/// Last path segment of a Rust type name with generics stripped.
///
/// `my_app::settings::Network<u8>` becomes `Network`.
#[must_use]
pub fn short_type_name(type_name: &str) -> &str {
    let base = type_name.split('<').next().unwrap_or(type_name);
    base.rsplit("::").next().unwrap_or(base)
}

/// `<TypeName>.cfg`
#[must_use]
pub fn default_file_name(type_name: &str) -> String {
    format!("{}.{DEFAULT_EXTENSION}", short_type_name(type_name))
}

/// Resolves the final relative file path for a config type.
///
/// 1. **File name**: override, else declared metadata, else `<TypeName>.cfg`.
/// 2. **Directory**: override, else declared metadata, else none.
#[must_use]
pub fn resolve_relative_path(
    type_name: &str,
    metadata: &NamingMetadata,
    overrides: Option<&PathSettings>,
) -> PathBuf {
    let file_name = overrides
        .and_then(PathSettings::file_name)
        .map(Cow::Borrowed)
        .or_else(|| metadata.declared_file_name().map(Cow::Borrowed))
        .unwrap_or_else(|| Cow::Owned(default_file_name(type_name)));

    let directory = overrides
        .and_then(PathSettings::relative_directory_path)
        .or_else(|| metadata.declared_directory());

    let mut path = directory.map(Path::to_path_buf).unwrap_or_default();
    path.push(file_name.as_ref());
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_type_name_strips_modules_and_generics() {
        assert_eq!(short_type_name("app::config::Network"), "Network");
        assert_eq!(short_type_name("app::Wrapper<app::Inner>"), "Wrapper");
        assert_eq!(short_type_name("Plain"), "Plain");
    }

    #[test]
    fn falls_back_to_type_name() {
        let path = resolve_relative_path("app::Counter", &NamingMetadata::new(), None);
        assert_eq!(path, PathBuf::from("Counter.cfg"));
    }

    #[test]
    fn metadata_applies_without_override() {
        let meta = NamingMetadata::new().file_name("console.json").directory("ui/console");
        let path = resolve_relative_path("app::Console", &meta, None);
        assert_eq!(path, PathBuf::from("ui/console/console.json"));
    }

    #[test]
    fn override_file_name_keeps_metadata_directory() {
        let meta = NamingMetadata::new().file_name("console.json").directory("ui");
        let overrides = PathSettings::with_file_name("custom.cfg").unwrap();
        let path = resolve_relative_path("app::Console", &meta, Some(&overrides));
        assert_eq!(path, PathBuf::from("ui/custom.cfg"));
    }

    #[test]
    fn override_directory_keeps_metadata_file_name() {
        let meta = NamingMetadata::new().file_name("console.json").directory("ui");
        let overrides = PathSettings::new(Some("PathOverride 1"), None).unwrap();
        let path = resolve_relative_path("app::Console", &meta, Some(&overrides));
        assert_eq!(path, PathBuf::from("PathOverride 1/console.json"));
    }

    #[test]
    fn empty_override_is_transparent() {
        let meta = NamingMetadata::new().directory("assets");
        let overrides = PathSettings::default();
        let path = resolve_relative_path("app::Timing", &meta, Some(&overrides));
        assert_eq!(path, PathBuf::from("assets/Timing.cfg"));
    }

    #[test]
    fn metadata_directory_drops_trailing_file_segment() {
        let meta = NamingMetadata::new().directory("assets/timing.json");
        assert_eq!(meta.declared_directory(), Some(Path::new("assets")));

        let bare = NamingMetadata::new().directory("timing.json");
        assert_eq!(bare.declared_directory(), None);
    }

    #[test]
    fn validate_rejects_bad_metadata() {
        assert!(NamingMetadata::new().file_name("no_extension").validate().is_err());
        assert!(NamingMetadata::new().directory("a|b").validate().is_err());
        assert!(NamingMetadata::new().file_name("ok.cfg").directory("dir").validate().is_ok());
    }
}
