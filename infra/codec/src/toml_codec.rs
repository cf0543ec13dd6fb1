use async_trait::async_trait;
use confhub_kernel::{Document, SerializationError, SerializationPort};
use serde_json::{Map, Value};

/// TOML codec.
///
/// TOML has no null, so `null` fields are left out when writing; the kernel's overlay keeps
/// the in-memory value for any field the file omits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TomlSerializer;

impl TomlSerializer {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SerializationPort for TomlSerializer {
    async fn serialize(&self, document: &Document) -> Result<Vec<u8>, SerializationError> {
        if !document.is_object() {
            return Err(SerializationError::encode("TOML documents must be tables"));
        }
        let text = toml::to_string_pretty(&strip_nulls(document))
            .map_err(SerializationError::encode)?;
        Ok(text.into_bytes())
    }

    async fn deserialize(&self, data: &[u8]) -> Result<Document, SerializationError> {
        let text = std::str::from_utf8(data).map_err(SerializationError::decode)?;
        toml::from_str(text).map_err(SerializationError::decode)
    }
}

fn strip_nulls(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), strip_nulls(v)))
                .collect::<Map<_, _>>(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(strip_nulls).collect()),
        other => other.clone(),
    }
}
