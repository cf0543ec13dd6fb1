//! Path validation helpers and the [`PathSettings`] override descriptor.

use crate::error::PathError;
use std::path::{Component, Path, PathBuf};

/// Characters that are never accepted in a relative config path.
const INVALID_CHARS: &[char] = &['<', '>', ':', '"', '|', '?', '*'];

/// Rejects control characters, reserved characters and absolute roots.
fn check_common(path: &str) -> Result<(), PathError> {
    if let Some(bad) = path.chars().find(|c| c.is_control() || INVALID_CHARS.contains(c)) {
        return Err(PathError::invalid(format!("Path \"{path}\" contains invalid char {bad:?}")));
    }

    let is_rooted = Path::new(path)
        .components()
        .any(|c| matches!(c, Component::RootDir | Component::Prefix(_)));
    if is_rooted || path.starts_with(['/', '\\']) {
        return Err(PathError::invalid(format!("Path \"{path}\" must be relative")));
    }

    Ok(())
}

/// Returns the extension of the last path segment, ignoring a trailing bare dot.
fn extension_of(path: &str) -> Option<&str> {
    Path::new(path).extension().and_then(|ext| ext.to_str()).filter(|ext| !ext.is_empty())
}

/// Validates a directory-shaped relative path: no extension, no invalid characters.
///
/// # Errors
/// Returns [`PathError::InvalidPath`] if the path is empty, rooted, carries an extension or
/// contains characters that are invalid in file-system paths.
pub fn check_directory_path(path: &str) -> Result<(), PathError> {
    if path.trim().is_empty() {
        return Err(PathError::invalid("Directory path cannot be empty"));
    }
    check_common(path)?;

    if let Some(ext) = extension_of(path) {
        return Err(PathError::invalid(format!(
            "Directory path \"{path}\" cannot contain extension \".{ext}\""
        )));
    }
    Ok(())
}

/// Validates a bare file name: has an extension and no directory component.
///
/// # Errors
/// Returns [`PathError::InvalidPath`] if the name is blank, contains a separator, lacks an
/// extension or contains characters that are invalid in file-system paths.
pub fn check_file_name(name: &str) -> Result<(), PathError> {
    if name.trim().is_empty() {
        return Err(PathError::invalid("File name cannot be empty"));
    }
    check_common(name)?;

    if name.contains(['/', '\\']) {
        return Err(PathError::invalid(format!(
            "File name \"{name}\" should not contain a directory path"
        )));
    }

    let stem = Path::new(name).file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    if stem.trim().is_empty() {
        return Err(PathError::invalid(format!("File name \"{name}\" should contain a name")));
    }

    if extension_of(name).is_none() {
        return Err(PathError::invalid(format!("File name \"{name}\" does not have extension")));
    }
    Ok(())
}

/// Caller-supplied directory and file name that take precedence over type-level naming.
///
/// Both parts are optional and validated on every write. An empty or missing input clears
/// the corresponding part.
///
/// # Example
///
/// ```rust
/// use confhub_domain::PathSettings;
/// use std::path::PathBuf;
///
/// let mut settings = PathSettings::default();
/// settings.set_relative_file_path("proxies/google/available.cfg").unwrap();
///
/// assert_eq!(settings.file_name(), Some("available.cfg"));
/// assert_eq!(settings.relative_directory_path(), Some(PathBuf::from("proxies/google").as_path()));
/// assert_eq!(settings.relative_file_path(), PathBuf::from("proxies/google/available.cfg"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathSettings {
    relative_directory_path: Option<PathBuf>,
    file_name: Option<String>,
}

impl PathSettings {
    /// Builds settings from optional parts, validating each one.
    ///
    /// # Errors
    /// Returns [`PathError::InvalidPath`] if either part is malformed.
    pub fn new(directory: Option<&str>, file_name: Option<&str>) -> Result<Self, PathError> {
        let mut settings = Self::default();
        settings.set_relative_directory_path(directory)?;
        settings.set_file_name(file_name)?;
        Ok(settings)
    }

    /// Settings carrying only a file name, as used by hub shards.
    ///
    /// # Errors
    /// Returns [`PathError::InvalidPath`] if the name is malformed.
    pub fn with_file_name(file_name: &str) -> Result<Self, PathError> {
        Self::new(None, Some(file_name))
    }

    #[must_use]
    pub fn relative_directory_path(&self) -> Option<&Path> {
        self.relative_directory_path.as_deref()
    }

    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// `true` when neither part is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.relative_directory_path.is_none() && self.file_name.is_none()
    }

    /// Joins directory and file name, omitting missing parts.
    #[must_use]
    pub fn relative_file_path(&self) -> PathBuf {
        let mut path = self.relative_directory_path.clone().unwrap_or_default();
        if let Some(name) = &self.file_name {
            path.push(name);
        }
        path
    }

    /// Splits a combined relative path into directory and file name.
    ///
    /// An empty input clears both parts.
    ///
    /// # Errors
    /// Returns [`PathError::InvalidPath`] if the path contains invalid characters, is rooted,
    /// or its final segment has no extension. On error the settings are left untouched.
    pub fn set_relative_file_path(&mut self, relative_file_path: &str) -> Result<(), PathError> {
        if relative_file_path.is_empty() {
            self.relative_directory_path = None;
            self.file_name = None;
            return Ok(());
        }
        check_common(relative_file_path)?;

        let path = Path::new(relative_file_path);
        let name = path.file_name().and_then(|n| n.to_str()).ok_or_else(|| {
            PathError::invalid(format!("Path \"{relative_file_path}\" has no file name"))
        })?;
        check_file_name(name)?;

        let directory = path.parent().filter(|p| !p.as_os_str().is_empty());
        if let Some(dir) = directory.and_then(Path::to_str) {
            check_directory_path(dir)?;
        }

        self.relative_directory_path = directory.map(Path::to_path_buf);
        self.file_name = Some(name.to_owned());
        Ok(())
    }

    /// Sets or clears the file name part.
    ///
    /// # Errors
    /// Returns [`PathError::InvalidPath`] if the name has a directory component or no extension.
    pub fn set_file_name(&mut self, file_name: Option<&str>) -> Result<(), PathError> {
        match file_name.filter(|name| !name.is_empty()) {
            None => self.file_name = None,
            Some(name) => {
                check_file_name(name)?;
                self.file_name = Some(name.to_owned());
            },
        }
        Ok(())
    }

    /// Sets or clears the directory part.
    ///
    /// # Errors
    /// Returns [`PathError::InvalidPath`] if the directory has an extension or invalid characters.
    pub fn set_relative_directory_path(&mut self, directory: Option<&str>) -> Result<(), PathError> {
        match directory.filter(|dir| !dir.is_empty()) {
            None => self.relative_directory_path = None,
            Some(dir) => {
                check_directory_path(dir)?;
                self.relative_directory_path = Some(PathBuf::from(dir));
            },
        }
        Ok(())
    }
}
