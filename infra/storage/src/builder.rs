use crate::error::{StorageError, StorageErrorExt};
use crate::local::{LocalFileSystem, LocalInner};
use private::Sealed;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use tokio::fs;
use tracing::info;

#[derive(Debug, Default)]
pub struct NoRoot;
#[derive(Debug)]
pub struct WithRoot(PathBuf);

mod private {
    pub(super) trait Sealed {}
}
impl Sealed for NoRoot {}
impl Sealed for WithRoot {}

#[allow(private_bounds)]
#[derive(Debug)]
pub struct LocalFileSystemBuilder<S: Sealed = NoRoot> {
    state: S,
    create: bool,
}

impl Default for LocalFileSystemBuilder<NoRoot> {
    fn default() -> Self {
        Self { state: NoRoot, create: true }
    }
}

#[allow(private_bounds)]
impl<S: Sealed> LocalFileSystemBuilder<S> {
    #[must_use = "Sets whether the application directory should be created if it does not exist"]
    pub const fn create(mut self, enable: bool) -> Self {
        self.create = enable;
        self
    }
}

impl LocalFileSystemBuilder<NoRoot> {
    #[must_use = "Creates a new builder with default configuration"]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "Sets the application directory every config path is resolved against"]
    pub fn root(self, path: impl Into<PathBuf>) -> LocalFileSystemBuilder<WithRoot> {
        LocalFileSystemBuilder { state: WithRoot(path.into()), create: self.create }
    }

    /// Uses the directory of the running executable, falling back to the working directory.
    #[must_use = "Sets the application directory every config path is resolved against"]
    pub fn executable_root(self) -> LocalFileSystemBuilder<WithRoot> {
        let root = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("."));
        self.root(root)
    }
}

impl LocalFileSystemBuilder<WithRoot> {
    /// Consumes the configuration and opens the file system.
    ///
    /// 1. **Bootstrapping**: creates the root if `create(true)` was set.
    /// 2. **Canonicalization**: resolves the root to a physical path so symlinks cannot be used
    ///    to escape it.
    /// 3. **Self-Healing**: removes stale `.cfgtmp.` files left by interrupted writes. Cleanup
    ///    failures are logged and do not fail the call.
    ///
    /// # Errors
    /// Returns [`StorageError::Io`] if the root is missing (with `create(false)`) or cannot be
    /// created or resolved.
    pub async fn connect(self) -> Result<LocalFileSystem, StorageError> {
        let root = &self.state.0;

        if self.create {
            fs::create_dir_all(root)
                .await
                .context(format!("Failed to bootstrap application directory: {}", root.display()))?;
            info!(path = %root.display(), "Bootstrapped application directory");
        }

        let canonical = fs::canonicalize(root)
            .await
            .context(format!("Failed to resolve application directory: {}", root.display()))?;

        let file_system = LocalFileSystem {
            inner: Arc::new(LocalInner { root: canonical, tmp_counter: AtomicU64::new(1) }),
        };

        file_system.purge_tmp().await;

        Ok(file_system)
    }
}
