//! [`FileSystemPort`] over the local disk.

use crate::builder::LocalFileSystemBuilder;
use crate::error::{StorageError, StorageErrorExt};
use crate::maintenance::{self, TMP_MARKER};
use crate::security;
use async_trait::async_trait;
use confhub_kernel::{FileStream, FileSystemError, FileSystemPort};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

#[derive(Debug)]
pub(crate) struct LocalInner {
    /// Canonical application directory; nothing outside it is ever touched.
    pub(crate) root: PathBuf,
    pub(crate) tmp_counter: AtomicU64,
}

/// Sandboxed, thread-safe handle to the local disk.
///
/// - **Sandbox**: every path must resolve inside the application directory.
/// - **Atomic writes**: streams write to a unique temp file that is `fsync`ed and renamed over
///   the target on commit, so a target is either fully old or fully new. An overwrite therefore
///   never leaves trailing bytes of a longer previous version.
/// - **Self-healing**: temp files orphaned by crashes are removed on connect.
///
/// ```rust
/// use confhub_kernel::FileSystemPort;
/// use confhub_storage::LocalFileSystem;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     # let tmp = tempfile::tempdir().unwrap();
///     let fs = LocalFileSystem::builder().root(tmp.path()).connect().await?;
///     let target = fs.application_directory().join("nested/settings.cfg");
///
///     fs.create_directories_along_path(&target).await?;
///     let mut stream = fs.create(&target).await?;
///     stream.write_all(b"{}").await?;
///     stream.commit().await?;
///
///     assert_eq!(fs.read_all_bytes(&target).await?, b"{}");
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct LocalFileSystem {
    pub(crate) inner: Arc<LocalInner>,
}

impl LocalFileSystem {
    #[must_use = "The file system is not opened until you call .connect()"]
    pub fn builder() -> LocalFileSystemBuilder {
        LocalFileSystemBuilder::new()
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.inner.root
    }

    /// Resolves a path against the sandbox.
    ///
    /// Symlink checks canonicalize on the blocking pool.
    ///
    /// # Errors
    /// Returns [`StorageError::PathTraversalAttempt`] if the path escapes the application
    /// directory, and [`StorageError::Io`] if an existing ancestor cannot be verified.
    pub async fn resolve(&self, path: impl AsRef<Path>) -> Result<PathBuf, StorageError> {
        let root = self.inner.root.clone();
        let path = path.as_ref().to_path_buf();

        tokio::task::spawn_blocking(move || security::resolve_path(&root, path))
            .await
            .map_err(|e| StorageError::Io {
                source: std::io::Error::other(e),
                context: Some("Path resolution task failed".into()),
            })?
    }

    async fn is_file(path: &Path) -> Result<bool, StorageError> {
        match fs::metadata(path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(StorageError::Io {
                source: err,
                context: Some(format!("Metadata read failed: {}", path.display()).into()),
            }),
        }
    }

    pub async fn purge_tmp(&self) {
        maintenance::purge_tmp(&self.inner.root).await;
    }

    async fn open_stream(&self, target: PathBuf) -> Result<AtomicFileStream, StorageError> {
        let temp = unique_tmp_path(&target, &self.inner.tmp_counter);

        let file = fs::OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&temp)
            .await
            .context(format!("Temp creation failed: {}", temp.display()))?;

        Ok(AtomicFileStream { file: Some(file), temp, target, committed: false })
    }

    async fn sync_dir(path: &Path) {
        match fs::File::open(path).await {
            Ok(dir) => {
                if let Err(err) = dir.sync_all().await {
                    warn!(path = %path.display(), error = %err, "Directory sync failed");
                }
            },
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Directory open failed");
            },
        }
    }
}

#[async_trait]
impl FileSystemPort for LocalFileSystem {
    async fn exists(&self, path: &Path) -> Result<bool, FileSystemError> {
        let target = self.resolve(path).await?;
        Ok(Self::is_file(&target).await?)
    }

    async fn create(&self, path: &Path) -> Result<Box<dyn FileStream>, FileSystemError> {
        let target = self.resolve(path).await?;
        Ok(Box::new(self.open_stream(target).await?))
    }

    async fn open_for_overwrite(
        &self,
        path: &Path,
    ) -> Result<Box<dyn FileStream>, FileSystemError> {
        let target = self.resolve(path).await?;
        if !Self::is_file(&target).await? {
            return Err(StorageError::FileNotFound {
                message: target.display().to_string().into(),
                context: Some("Overwrite target must exist".into()),
            }
            .into());
        }
        Ok(Box::new(self.open_stream(target).await?))
    }

    async fn delete(&self, path: &Path) -> Result<(), FileSystemError> {
        let resolved = self.resolve(path).await?;
        match fs::remove_file(&resolved).await {
            Ok(()) => {},
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::FileNotFound {
                    message: resolved.display().to_string().into(),
                    context: None,
                }
                .into());
            },
            Err(err) => {
                return Err(StorageError::Io {
                    source: err,
                    context: Some(format!("Failed to delete: {}", resolved.display()).into()),
                }
                .into());
            },
        }
        debug!(path = %resolved.display(), "File deleted");
        Ok(())
    }

    async fn read_all_bytes(&self, path: &Path) -> Result<Vec<u8>, FileSystemError> {
        let resolved = self.resolve(path).await?;
        match fs::read(&resolved).await {
            Ok(data) => Ok(data),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::FileNotFound {
                    message: resolved.display().to_string().into(),
                    context: None,
                }
                .into())
            },
            Err(err) => Err(StorageError::Io {
                source: err,
                context: Some(format!("Read failed: {}", resolved.display()).into()),
            }
            .into()),
        }
    }

    async fn create_directories_along_path(&self, path: &Path) -> Result<(), FileSystemError> {
        let resolved = self.resolve(path).await?;
        if let Some(parent) = resolved.parent() {
            fs::create_dir_all(parent)
                .await
                .context(format!("Failed to create directories for {}", resolved.display()))?;
        }
        Ok(())
    }

    fn application_directory(&self) -> &Path {
        &self.inner.root
    }
}

/// Write stream that publishes its data with a rename on commit.
///
/// Dropping it uncommitted removes the temp file; a crash leaves it for [`purge_tmp`].
///
/// [`purge_tmp`]: LocalFileSystem::purge_tmp
#[derive(Debug)]
struct AtomicFileStream {
    file: Option<fs::File>,
    temp: PathBuf,
    target: PathBuf,
    committed: bool,
}

impl AtomicFileStream {
    async fn publish(&mut self) -> Result<(), StorageError> {
        if let Some(mut file) = self.file.take() {
            file.flush().await.context("Flush failed")?;
            file.sync_all().await.context("Hardware sync failed")?;
        }

        if let Err(err) = fs::rename(&self.temp, &self.target).await {
            if err.kind() == std::io::ErrorKind::AlreadyExists {
                fs::remove_file(&self.target).await.context(format!(
                    "Failed to replace existing file: {}",
                    self.target.display()
                ))?;
                fs::rename(&self.temp, &self.target).await.context(format!(
                    "Atomic swap failed: {} -> {}",
                    self.temp.display(),
                    self.target.display()
                ))?;
            } else {
                return Err(StorageError::Io {
                    source: err,
                    context: Some(
                        format!(
                            "Atomic swap failed: {} -> {}",
                            self.temp.display(),
                            self.target.display()
                        )
                        .into(),
                    ),
                });
            }
        }

        self.committed = true;
        if let Some(parent) = self.target.parent() {
            LocalFileSystem::sync_dir(parent).await;
        }
        Ok(())
    }
}

#[async_trait]
impl FileStream for AtomicFileStream {
    async fn write_all(&mut self, data: &[u8]) -> Result<(), FileSystemError> {
        let file = self.file.as_mut().ok_or("Stream already committed")?;
        file.write_all(data).await.context("Write failed")?;
        Ok(())
    }

    async fn commit(mut self: Box<Self>) -> Result<(), FileSystemError> {
        self.publish().await?;
        debug!(path = %self.target.display(), "File saved atomically");
        Ok(())
    }
}

impl Drop for AtomicFileStream {
    fn drop(&mut self) {
        self.file.take();
        if self.committed {
            return;
        }
        if let Err(err) = std::fs::remove_file(&self.temp) {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.temp.display(), error = %err, "Abandoned temp file kept");
            }
        }
    }
}

fn unique_tmp_path(target: &Path, counter: &AtomicU64) -> PathBuf {
    let counter = counter.fetch_add(1, Ordering::Relaxed);
    let file_name = target.file_name().and_then(|s| s.to_str()).unwrap_or("config");
    target.with_file_name(format!("{file_name}{TMP_MARKER}{counter}"))
}
