use confhub_kernel::FileSystemError;
use std::borrow::Cow;

/// A specialized [`StorageError`] enum of this crate.
#[confhub_derive::confhub_error]
pub enum StorageError {
    #[error("File not found{}: {message}", format_context(.context))]
    FileNotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Path traversal security violation{}: {message}", format_context(.context))]
    PathTraversalAttempt { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Hardware I/O failure{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },
}

impl From<StorageError> for FileSystemError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::FileNotFound { message, context } => Self::NotFound { message, context },
            StorageError::PathTraversalAttempt { message, context } => {
                Self::Rejected { message, context }
            },
            StorageError::Io { source, context } => Self::Io { source, context },
        }
    }
}
