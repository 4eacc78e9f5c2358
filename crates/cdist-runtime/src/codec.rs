//! Pluggable marshal/unmarshal strategies.
//!
//! Codecs pivot through `serde_json::Value` so one object-safe trait
//! serves every structured-text wire format. The pivot also gives every
//! decoder a uniform path from bytes to a concrete type:
//! [`unmarshal_typed`] goes bytes -> value -> type, [`marshal_typed`]
//! the reverse.

use crate::error::DecodeError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// A stateless marshal/unmarshal capability pair.
pub trait Codec: Send + Sync {
    /// Short lowercase identifier (`"json"`, `"yaml"`), used in error
    /// messages and to recover a codec via [`by_name`].
    fn name(&self) -> &'static str;

    fn marshal(&self, value: &Value) -> Result<Vec<u8>, DecodeError>;

    fn unmarshal(&self, raw: &[u8]) -> Result<Value, DecodeError>;
}

/// JSON codec backed by serde_json.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }

    fn marshal(&self, value: &Value) -> Result<Vec<u8>, DecodeError> {
        serde_json::to_vec(value).map_err(|e| DecodeError::malformed("json", e.to_string()))
    }

    fn unmarshal(&self, raw: &[u8]) -> Result<Value, DecodeError> {
        serde_json::from_slice(raw).map_err(|e| DecodeError::malformed("json", e.to_string()))
    }
}

/// YAML codec backed by serde_yaml. YAML is a superset of JSON, so this
/// codec also accepts JSON payloads.
#[derive(Debug, Default, Clone, Copy)]
pub struct YamlCodec;

impl Codec for YamlCodec {
    fn name(&self) -> &'static str {
        "yaml"
    }

    fn marshal(&self, value: &Value) -> Result<Vec<u8>, DecodeError> {
        serde_yaml::to_string(value)
            .map(String::into_bytes)
            .map_err(|e| DecodeError::malformed("yaml", e.to_string()))
    }

    fn unmarshal(&self, raw: &[u8]) -> Result<Value, DecodeError> {
        serde_yaml::from_slice(raw).map_err(|e| DecodeError::malformed("yaml", e.to_string()))
    }
}

/// Process-wide JSON codec instance.
pub static JSON: JsonCodec = JsonCodec;

/// Process-wide YAML codec instance.
pub static YAML: YamlCodec = YamlCodec;

/// The codec assumed when none is stated.
pub fn default_codec() -> &'static dyn Codec {
    &JSON
}

/// Recovers a codec instance from its [`Codec::name`].
pub fn by_name(name: &str) -> Option<&'static dyn Codec> {
    match name {
        "json" => Some(&JSON),
        "yaml" => Some(&YAML),
        _ => None,
    }
}

/// Unmarshals `raw` into a concrete type through the codec's pivot value.
pub fn unmarshal_typed<T: DeserializeOwned>(
    raw: &[u8],
    codec: &dyn Codec,
) -> Result<T, DecodeError> {
    let value = codec.unmarshal(raw)?;
    serde_json::from_value(value).map_err(|e| DecodeError::malformed(codec.name(), e.to_string()))
}

/// Marshals a concrete type to bytes through the codec's pivot value.
pub fn marshal_typed<T: Serialize + ?Sized>(
    obj: &T,
    codec: &dyn Codec,
) -> Result<Vec<u8>, DecodeError> {
    let value =
        serde_json::to_value(obj).map_err(|e| DecodeError::malformed(codec.name(), e.to_string()))?;
    codec.marshal(&value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        #[serde(rename = "type")]
        spec_type: String,
        count: u32,
    }

    #[test]
    fn test_json_round_trip() {
        let sample = Sample {
            spec_type: "sample/v1".into(),
            count: 3,
        };
        let raw = marshal_typed(&sample, &JSON).unwrap();
        let back: Sample = unmarshal_typed(&raw, &JSON).unwrap();
        assert_eq!(back, sample);
    }

    #[test]
    fn test_yaml_round_trip() {
        let sample = Sample {
            spec_type: "sample/v1".into(),
            count: 7,
        };
        let raw = marshal_typed(&sample, &YAML).unwrap();
        let back: Sample = unmarshal_typed(&raw, &YAML).unwrap();
        assert_eq!(back, sample);
    }

    #[test]
    fn test_yaml_accepts_json_input() {
        let raw = br#"{"type": "sample/v1", "count": 1}"#;
        let back: Sample = unmarshal_typed(raw, &YAML).unwrap();
        assert_eq!(back.count, 1);
    }

    #[test]
    fn test_json_rejects_garbage() {
        let err = JSON.unmarshal(b"{not json").unwrap_err();
        assert!(matches!(err, DecodeError::MalformedPayload { codec: "json", .. }));
    }

    #[test]
    fn test_by_name() {
        assert_eq!(by_name("json").unwrap().name(), "json");
        assert_eq!(by_name("yaml").unwrap().name(), "yaml");
        assert!(by_name("toml").is_none());
    }
}
