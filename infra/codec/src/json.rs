use async_trait::async_trait;
use confhub_kernel::{Document, SerializationError, SerializationPort};

/// JSON codec writing human-readable, indented documents.
///
/// ```rust
/// # use confhub_codec::JsonSerializer;
/// # use confhub_kernel::SerializationPort;
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), confhub_kernel::SerializationError> {
/// let json = JsonSerializer::new();
/// let bytes = json.serialize(&serde_json::json!({ "count": 0 })).await?;
/// assert_eq!(bytes, b"{\n  \"count\": 0\n}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonSerializer {
    pretty: bool,
}

impl Default for JsonSerializer {
    fn default() -> Self {
        Self { pretty: true }
    }
}

impl JsonSerializer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-line output.
    #[must_use]
    pub const fn compact() -> Self {
        Self { pretty: false }
    }
}

#[async_trait]
impl SerializationPort for JsonSerializer {
    async fn serialize(&self, document: &Document) -> Result<Vec<u8>, SerializationError> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(document)
        } else {
            serde_json::to_vec(document)
        };
        bytes.map_err(SerializationError::encode)
    }

    async fn deserialize(&self, data: &[u8]) -> Result<Document, SerializationError> {
        let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
        serde_json::from_slice(data).map_err(|e| {
            tracing::debug!(error = %e, "Rejected JSON document");
            SerializationError::decode(e)
        })
    }
}
