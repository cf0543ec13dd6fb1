use std::borrow::Cow;

/// Validation failures for paths, file names and naming templates.
#[confhub_derive::confhub_error]
pub enum PathError {
    #[error("Invalid path{}: {message}", format_context(.context))]
    InvalidPath { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Invalid naming template{}: {message}", format_context(.context))]
    InvalidFormat { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl PathError {
    pub(crate) fn invalid(message: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidPath { message: message.into(), context: None }
    }

    pub(crate) fn format(message: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidFormat { message: message.into(), context: None }
    }
}
