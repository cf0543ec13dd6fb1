use crate::error::StorageError;
use std::path::{Component, Path, PathBuf};

/// Collapse `.` / `..` lexically while ensuring the path never escapes the sandbox root.
fn normalize_relative(path: &Path) -> Result<PathBuf, StorageError> {
    let mut out = PathBuf::new();

    for c in path.components() {
        match c {
            Component::CurDir => {},
            Component::Normal(seg) => out.push(seg),
            Component::ParentDir => {
                if !out.pop() {
                    return Err(StorageError::PathTraversalAttempt {
                        message: path.display().to_string().into(),
                        context: Some("Path attempted to escape sandbox via '..'".into()),
                    });
                }
            },
            Component::RootDir | Component::Prefix(_) => {
                return Err(StorageError::PathTraversalAttempt {
                    message: path.display().to_string().into(),
                    context: Some("Absolute paths must start at the application directory".into()),
                });
            },
        }
    }

    Ok(out)
}

/// Maps a port path onto the canonical root and verifies it stays inside.
///
/// Absolute inputs must start with `root` (the value handed out as the application
/// directory); relative inputs are taken relative to it.
pub(crate) fn resolve_path(root: &Path, path: impl AsRef<Path>) -> Result<PathBuf, StorageError> {
    let path = path.as_ref();

    let relative = if path.is_absolute() {
        path.strip_prefix(root).map_err(|_| StorageError::PathTraversalAttempt {
            message: path.display().to_string().into(),
            context: Some("Path is outside the application directory".into()),
        })?
    } else {
        path
    };

    let joined = root.join(normalize_relative(relative)?);

    match joined.canonicalize() {
        Ok(canonical) => validate_canonical(root, canonical),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => validate_path(root, &joined),
        Err(e) => Err(StorageError::Io { source: e, context: None }),
    }
}

fn validate_canonical(root: &Path, canonical: PathBuf) -> Result<PathBuf, StorageError> {
    if canonical.starts_with(root) {
        Ok(canonical)
    } else {
        Err(StorageError::PathTraversalAttempt {
            message: canonical.display().to_string().into(),
            context: Some("Path resolves outside the sandbox".into()),
        })
    }
}

/// Validates a path that doesn't exist yet through its first existing ancestor.
///
/// Canonicalizing that ancestor catches symlinked directories pointing out of the sandbox
/// without requiring the intermediate directories to exist.
fn validate_path(root: &Path, joined: &Path) -> Result<PathBuf, StorageError> {
    let mut current = Some(joined);

    while let Some(path) = current {
        if path == root {
            return Ok(joined.to_path_buf());
        }

        if path.exists() {
            return match path.canonicalize() {
                Ok(canonical) if canonical.starts_with(root) => Ok(joined.to_path_buf()),
                Ok(canonical) => Err(StorageError::PathTraversalAttempt {
                    message: canonical.display().to_string().into(),
                    context: Some("Existing parent directory is a symlink outside sandbox".into()),
                }),
                Err(e) => Err(StorageError::Io {
                    source: e,
                    context: Some("Failed to verify parent directory".into()),
                }),
            };
        }

        current = path.parent();
    }

    Err(StorageError::PathTraversalAttempt {
        message: joined.display().to_string().into(),
        context: Some("No valid parent directory found within sandbox".into()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_rejects_escapes() {
        assert!(normalize_relative(Path::new("../etc")).is_err());
        assert!(normalize_relative(Path::new("a/../../b")).is_err());
        assert_eq!(normalize_relative(Path::new("a/./b/../c.cfg")).unwrap(), Path::new("a/c.cfg"));
    }

    #[test]
    fn absolute_paths_must_share_the_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();

        let inside = resolve_path(&root, root.join("nested/a.cfg")).unwrap();
        assert_eq!(inside, root.join("nested/a.cfg"));

        assert!(resolve_path(&root, Path::new("/elsewhere.cfg")).is_err());
        assert!(resolve_path(&root, root.join("../escape.cfg")).is_err());
    }
}
