use async_trait::async_trait;
use std::borrow::Cow;
use std::fmt::Debug;
use std::path::Path;

/// Failures reported by a [`FileSystemPort`] adapter.
#[confhub_derive::confhub_error]
pub enum FileSystemError {
    #[error("File not found{}: {message}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Path rejected{}: {message}", format_context(.context))]
    Rejected { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("I/O failure{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[error("File system failure{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// An open, writable file handed out by [`FileSystemPort::create`] and
/// [`FileSystemPort::open_for_overwrite`].
///
/// Bytes become visible at the target path once [`FileStream::commit`] returns. Dropping a
/// stream without committing releases it and leaves the adapter free to discard the data.
#[async_trait]
pub trait FileStream: Send + Debug {
    /// # Errors
    /// Returns [`FileSystemError::Io`] if the bytes cannot be written.
    async fn write_all(&mut self, data: &[u8]) -> Result<(), FileSystemError>;

    /// Flushes and releases the stream.
    ///
    /// # Errors
    /// Returns [`FileSystemError::Io`] if flushing or publishing the file fails.
    async fn commit(self: Box<Self>) -> Result<(), FileSystemError>;
}

/// Storage the lifecycle manager reads and writes config files through.
///
/// Paths handed to the port are absolute-looking paths rooted at
/// [`FileSystemPort::application_directory`].
#[async_trait]
pub trait FileSystemPort: Send + Sync + Debug {
    /// `true` when `path` names an existing regular file.
    ///
    /// # Errors
    /// Returns [`FileSystemError::Rejected`] if the adapter refuses the path.
    async fn exists(&self, path: &Path) -> Result<bool, FileSystemError>;

    /// Creates (or truncates) a file and returns a stream to it.
    ///
    /// # Errors
    /// Returns [`FileSystemError::Io`] or [`FileSystemError::Rejected`].
    async fn create(&self, path: &Path) -> Result<Box<dyn FileStream>, FileSystemError>;

    /// Opens an existing file for writing; committed data replaces the previous content.
    ///
    /// # Errors
    /// Returns [`FileSystemError::NotFound`] if the file is missing.
    async fn open_for_overwrite(&self, path: &Path)
    -> Result<Box<dyn FileStream>, FileSystemError>;

    /// # Errors
    /// Returns [`FileSystemError::NotFound`] if the file is missing.
    async fn delete(&self, path: &Path) -> Result<(), FileSystemError>;

    /// # Errors
    /// Returns [`FileSystemError::NotFound`] if the file is missing.
    async fn read_all_bytes(&self, path: &Path) -> Result<Vec<u8>, FileSystemError>;

    /// Ensures every directory on the way to `path` exists.
    ///
    /// `path` is a file path; only its parent chain is created.
    ///
    /// # Errors
    /// Returns [`FileSystemError::Io`] or [`FileSystemError::Rejected`].
    async fn create_directories_along_path(&self, path: &Path) -> Result<(), FileSystemError>;

    /// Root every config path is resolved against.
    fn application_directory(&self) -> &Path;
}
