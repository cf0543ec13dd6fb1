use crate::config::Document;
use async_trait::async_trait;
use std::borrow::Cow;
use std::fmt::Debug;

#[confhub_derive::confhub_error]
pub enum SerializationError {
    #[error("Encoding failed{}: {message}", format_context(.context))]
    Encode { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Decoding failed{}: {message}", format_context(.context))]
    Decode { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl SerializationError {
    pub fn encode(message: impl ToString) -> Self {
        Self::Encode { message: message.to_string().into(), context: None }
    }

    pub fn decode(message: impl ToString) -> Self {
        Self::Decode { message: message.to_string().into(), context: None }
    }
}

/// Converts between bytes on disk and the [`Document`] tree the kernel works with.
///
/// Decoding produces a fresh document; the kernel merges it into the live instance itself,
/// so adapters never see the typed config.
#[async_trait]
pub trait SerializationPort: Send + Sync + Debug {
    /// # Errors
    /// Returns [`SerializationError::Encode`] if the document cannot be represented.
    async fn serialize(&self, document: &Document) -> Result<Vec<u8>, SerializationError>;

    /// # Errors
    /// Returns [`SerializationError::Decode`] for malformed input.
    async fn deserialize(&self, data: &[u8]) -> Result<Document, SerializationError>;
}
