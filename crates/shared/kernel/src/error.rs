use crate::ports::{FileSystemError, SerializationError};
use confhub_domain::PathError;
use std::borrow::Cow;
use std::time::Duration;

/// Every failure the lifecycle manager and the hub report.
///
/// Variants that concern one registered type carry its identifier in `id`; hub failures carry
/// the shard in the context (`shard <id>`).
#[confhub_derive::confhub_error]
pub enum ConfigsError {
    #[error("Config type `{id}` is already registered{}", format_context(.context))]
    DuplicateRegistration { id: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Invalid config identifier{}: {message}", format_context(.context))]
    InvalidIdentifier { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Config type `{id}` is not registered{}", format_context(.context))]
    UnknownType { id: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error(
        "Config `{id}` is registered as `{registered}`, requested as `{requested}`{}",
        format_context(.context)
    )]
    TypeMismatch {
        id: Cow<'static, str>,
        registered: &'static str,
        requested: &'static str,
        context: Option<Cow<'static, str>>,
    },

    #[error("Config file for `{id}` not found{}: {path}", format_context(.context))]
    FileNotFound { id: Cow<'static, str>, path: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Config `{id}` failed the correctness check{}: {message}", format_context(.context))]
    ConfigDataInvalid {
        id: Cow<'static, str>,
        message: Cow<'static, str>,
        context: Option<Cow<'static, str>>,
    },

    #[error("`{operation}` on `{id}` exceeded {timeout:?}{}", format_context(.context))]
    OperationTimeout {
        operation: &'static str,
        id: Cow<'static, str>,
        timeout: Duration,
        context: Option<Cow<'static, str>>,
    },

    #[error("Shard not found{}: {message}", format_context(.context))]
    UnknownShard { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Invalid path{}: {source}", format_context(.context))]
    InvalidPath { source: PathError, context: Option<Cow<'static, str>> },

    #[error("File system failure{}: {source}", format_context(.context))]
    FileSystem { source: FileSystemError, context: Option<Cow<'static, str>> },

    #[error("Serialization failure{}: {source}", format_context(.context))]
    Serialization { source: SerializationError, context: Option<Cow<'static, str>> },

    #[error("Config document does not match its type{}: {source}", format_context(.context))]
    Document { source: serde_json::Error, context: Option<Cow<'static, str>> },

    #[error("Settings error{}: {source}", format_context(.context))]
    Settings { source: ::config::ConfigError, context: Option<Cow<'static, str>> },
}

impl ConfigsError {
    pub(crate) fn unknown_type(id: &str) -> Self {
        Self::UnknownType { id: id.to_owned().into(), context: None }
    }

    pub(crate) fn unknown_shard(message: impl Into<Cow<'static, str>>) -> Self {
        Self::UnknownShard { message: message.into(), context: None }
    }

    /// `true` for failures raised because a step ran out of time.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::OperationTimeout { .. })
    }
}
