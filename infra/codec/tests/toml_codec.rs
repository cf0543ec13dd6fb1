#![cfg(feature = "toml")]

use confhub_codec::TomlSerializer;
use confhub_kernel::{SerializationError, SerializationPort};
use serde_json::json;

#[tokio::test]
async fn test_toml_roundtrip_drops_nulls() {
    let toml = TomlSerializer::new();
    let document = json!({ "name": "main", "limit": 3, "owner": null, "items": [1, 2] });

    let bytes = toml.serialize(&document).await.unwrap();
    let text = String::from_utf8(bytes.clone()).unwrap();
    assert!(text.contains("name = \"main\""));
    assert!(!text.contains("owner"));

    let decoded = toml.deserialize(&bytes).await.unwrap();
    assert_eq!(decoded, json!({ "name": "main", "limit": 3, "items": [1, 2] }));
}

#[tokio::test]
async fn test_invalid_toml_is_a_decode_error() {
    let err = TomlSerializer::new().deserialize(b"name = ").await.unwrap_err();
    assert!(matches!(err, SerializationError::Decode { .. }));
}
