//! Wire envelope codec
//!
//! Every stored value is persisted as a JSON envelope:
//!
//! ```text
//! {"value": <any>, "metadata": <object>}
//! ```
//!
//! Binary payloads cannot travel inside JSON text directly, so they are
//! base64-wrapped and tagged:
//!
//! ```text
//! {"value": "<base64>", "encoding": "base64",
//!  "original_encoding": "binary", "metadata": <object>}
//! ```
//!
//! This is the only indirection needed to make arbitrary bytes safe in
//! the envelope; every backend stores the serialized text verbatim.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use kvstash_common::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Encoding tag applied to base64-wrapped byte values
const ENCODING_BASE64: &str = "base64";

/// Original-encoding tag recorded for raw byte values
const ORIGINAL_ENCODING_BINARY: &str = "binary";

/// A storable value: either a JSON value or a raw byte string.
#[derive(Clone, Debug, PartialEq)]
pub enum KvValue {
    /// Any JSON value (string, number, bool, array, object, null)
    Json(Value),
    /// An arbitrary byte sequence, base64-wrapped on the wire
    Bytes(Vec<u8>),
}

impl KvValue {
    /// View the value as a string slice, when it is a JSON string
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Json(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    /// View the value as raw bytes, when it is a byte string
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

impl From<&str> for KvValue {
    fn from(s: &str) -> Self {
        Self::Json(Value::String(s.to_string()))
    }
}

impl From<String> for KvValue {
    fn from(s: String) -> Self {
        Self::Json(Value::String(s))
    }
}

impl From<Vec<u8>> for KvValue {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(b)
    }
}

impl From<Value> for KvValue {
    fn from(v: Value) -> Self {
        Self::Json(v)
    }
}

/// The persisted wire form of a value and its metadata
#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    encoding: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    original_encoding: Option<String>,
    metadata: Map<String, Value>,
}

/// Serialize a value and its metadata into envelope text
pub fn encode(value: &KvValue, metadata: &Map<String, Value>) -> Result<String> {
    let envelope = match value {
        KvValue::Json(v) => Envelope {
            value: v.clone(),
            encoding: None,
            original_encoding: None,
            metadata: metadata.clone(),
        },
        KvValue::Bytes(b) => Envelope {
            value: Value::String(BASE64.encode(b)),
            encoding: Some(ENCODING_BASE64.to_string()),
            original_encoding: Some(ORIGINAL_ENCODING_BINARY.to_string()),
            metadata: metadata.clone(),
        },
    };

    serde_json::to_string(&envelope).map_err(|e| Error::serialization(e.to_string()))
}

/// Parse envelope text back into a value and its metadata
pub fn decode(text: &str) -> Result<(KvValue, Map<String, Value>)> {
    let parsed: Value = serde_json::from_str(text)
        .map_err(|e| Error::serialization(format!("invalid envelope JSON: {}", e)))?;

    let Value::Object(mut envelope) = parsed else {
        return Err(Error::serialization(format!(
            "envelope is not a JSON object: '{}'",
            text
        )));
    };

    let Some(value) = envelope.remove("value") else {
        return Err(Error::serialization(format!(
            "value missing in envelope '{}'",
            text
        )));
    };

    let metadata = match envelope.remove("metadata") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(m)) => m,
        Some(other) => {
            return Err(Error::serialization(format!(
                "envelope metadata is not an object: {}",
                other
            )));
        }
    };

    let value = match envelope.get("encoding").and_then(Value::as_str) {
        None => KvValue::Json(value),
        Some(ENCODING_BASE64) => {
            let Value::String(encoded) = value else {
                return Err(Error::serialization(
                    "base64-encoded envelope value is not a string".to_string(),
                ));
            };
            let bytes = BASE64
                .decode(encoded.as_bytes())
                .map_err(|e| Error::serialization(format!("invalid base64 value: {}", e)))?;
            KvValue::Bytes(bytes)
        }
        Some(other) => return Err(Error::UnsupportedEncoding(other.to_string())),
    };

    Ok((value, metadata))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meta(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_encode_string_value() {
        let text = encode(&KvValue::from("42"), &Map::new()).unwrap();
        assert_eq!(text, r#"{"value":"42","metadata":{}}"#);
    }

    #[test]
    fn test_roundtrip_json_value() {
        let metadata = meta(&[("origin", json!("test"))]);
        let value = KvValue::Json(json!({"a": [1, 2, 3], "b": null}));

        let text = encode(&value, &metadata).unwrap();
        let (decoded, decoded_meta) = decode(&text).unwrap();
        assert_eq!(decoded, value);
        assert_eq!(decoded_meta, metadata);
    }

    #[test]
    fn test_roundtrip_binary_value() {
        // not valid UTF-8
        let bytes = vec![0xffu8, 0x00, 0xfe, 0x42];
        let text = encode(&KvValue::Bytes(bytes.clone()), &Map::new()).unwrap();
        assert!(text.contains(r#""encoding":"base64""#));
        assert!(text.contains(r#""original_encoding":"binary""#));

        let (decoded, _) = decode(&text).unwrap();
        assert_eq!(decoded.as_bytes(), Some(bytes.as_slice()));
    }

    #[test]
    fn test_decode_missing_value() {
        let err = decode(r#"{"metadata":{}}"#).unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_decode_unsupported_encoding() {
        let err = decode(r#"{"value":"x","encoding":"rot13","metadata":{}}"#).unwrap_err();
        assert!(matches!(err, Error::UnsupportedEncoding(e) if e == "rot13"));
    }

    #[test]
    fn test_decode_invalid_json() {
        assert!(decode("not json at all").is_err());
        assert!(decode(r#"["value"]"#).is_err());
    }

    #[test]
    fn test_decode_absent_metadata() {
        let (value, metadata) = decode(r#"{"value":17}"#).unwrap();
        assert_eq!(value, KvValue::Json(json!(17)));
        assert!(metadata.is_empty());
    }
}
