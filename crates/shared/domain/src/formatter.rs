//! Placeholder-based naming for hub shards.
//!
//! | Placeholder | Meaning | Allowed in |
//! |-------------|---------|------------|
//! | `{id}` | shard id | subdirectory format (optional), file-name template (required) |
//! | `{n}` | stem of the base file name | file-name template |
//! | `{ex}` | extension of the base file name, dot included | file-name template |

use crate::error::PathError;
use crate::path::{check_directory_path, check_file_name};
use std::path::{Path, PathBuf};

pub const ID_PLACEHOLDER: &str = "{id}";
pub const NAME_PLACEHOLDER: &str = "{n}";
pub const EXTENSION_PLACEHOLDER: &str = "{ex}";

/// Directory layout of a hub: `<common>/<subdirectory_format with {id}>/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathsFormatter {
    common_directory: PathBuf,
    subdirectory_format: String,
}

impl Default for PathsFormatter {
    fn default() -> Self {
        Self { common_directory: PathBuf::new(), subdirectory_format: ID_PLACEHOLDER.to_owned() }
    }
}

impl PathsFormatter {
    /// # Errors
    /// Returns [`PathError::InvalidPath`] if the common directory or the formatted subdirectory
    /// is not a valid relative directory path.
    pub fn new(
        common_directory: Option<&str>,
        subdirectory_format: impl Into<String>,
    ) -> Result<Self, PathError> {
        let common_directory = match common_directory.filter(|dir| !dir.is_empty()) {
            Some(dir) => {
                check_directory_path(dir)?;
                PathBuf::from(dir)
            },
            None => PathBuf::new(),
        };

        let formatter = Self { common_directory, subdirectory_format: subdirectory_format.into() };
        check_directory_path(&formatter.formatted_subdirectory(0))?;
        Ok(formatter)
    }

    #[must_use]
    pub fn common_directory(&self) -> &Path {
        &self.common_directory
    }

    #[must_use]
    pub fn subdirectory_format(&self) -> &str {
        &self.subdirectory_format
    }

    #[must_use]
    pub fn formatted_subdirectory(&self, id: usize) -> String {
        self.subdirectory_format.replace(ID_PLACEHOLDER, &id.to_string())
    }

    /// `<common>/<formatted subdirectory>` for the given shard id.
    #[must_use]
    pub fn shard_directory(&self, id: usize) -> PathBuf {
        self.common_directory.join(self.formatted_subdirectory(id))
    }

    /// Expands a file-name template for one shard.
    ///
    /// `{n}` and `{ex}` are taken from `base_file_name`, typically the name the naming
    /// policy would pick for the type without any override.
    ///
    /// # Errors
    /// Returns [`PathError::InvalidFormat`] if the template lacks `{id}`, and
    /// [`PathError::InvalidPath`] if the expanded value is not a valid file name.
    pub fn format_file_name(
        template: &str,
        base_file_name: &str,
        id: usize,
    ) -> Result<String, PathError> {
        if !template.contains(ID_PLACEHOLDER) {
            return Err(PathError::format(format!(
                "File name template \"{template}\" must contain placeholder \"{ID_PLACEHOLDER}\""
            )));
        }

        let base = Path::new(base_file_name);
        let stem = base.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        let extension = base
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{e}"))
            .unwrap_or_default();

        let name = template
            .replace(NAME_PLACEHOLDER, stem)
            .replace(EXTENSION_PLACEHOLDER, &extension)
            .replace(ID_PLACEHOLDER, &id.to_string());

        check_file_name(&name)?;
        Ok(name)
    }
}
