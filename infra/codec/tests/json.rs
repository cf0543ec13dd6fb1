use confhub_codec::JsonSerializer;
use confhub_kernel::{SerializationError, SerializationPort};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Catalog {
    name: String,
    items: Vec<u32>,
}

#[tokio::test]
async fn test_pretty_output_is_readable_and_decodable() {
    let json = JsonSerializer::new();
    let document = serde_json::to_value(Catalog { name: "main".into(), items: vec![1, 2] }).unwrap();

    let bytes = json.serialize(&document).await.unwrap();
    let text = std::str::from_utf8(&bytes).unwrap();
    assert!(text.contains("\n  \"name\": \"main\""), "output should be indented: {text}");

    let decoded = json.deserialize(&bytes).await.unwrap();
    let catalog: Catalog = serde_json::from_value(decoded).unwrap();
    assert_eq!(catalog, Catalog { name: "main".into(), items: vec![1, 2] });
}

#[tokio::test]
async fn test_compact_output() {
    let bytes = JsonSerializer::compact().serialize(&json!({ "count": 5 })).await.unwrap();
    assert_eq!(bytes, br#"{"count":5}"#);
}

#[tokio::test]
async fn test_byte_order_mark_is_accepted() {
    let doc = JsonSerializer::new().deserialize(b"\xEF\xBB\xBF{\"count\":1}").await.unwrap();
    assert_eq!(doc, json!({ "count": 1 }));
}

#[tokio::test]
async fn test_malformed_input_is_a_decode_error() {
    let err = JsonSerializer::new().deserialize(b"{ \"count\": ").await.unwrap_err();
    assert!(matches!(err, SerializationError::Decode { .. }));
    assert_eq!(err.kind(), "Decode");
}
