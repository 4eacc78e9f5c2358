//! Raw-preserving generic representation of discriminated payloads.
//!
//! An [`UnstructuredObject`] is the universal interchange form between
//! "don't know the concrete type yet" and "know it now": it holds the
//! normalized discriminator, the parsed field map, and the exact input
//! bytes so an untouched payload re-emits verbatim. Mutating the field
//! map recomputes the raw bytes, so they are always valid, re-parseable
//! codec output.

use crate::codec::{self, Codec};
use crate::discriminator::Discriminator;
use crate::error::DecodeError;
use crate::scheme::Scheme;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Wire field carrying the combined discriminator string.
pub const TYPE_FIELD: &str = "type";

/// Wire field carrying the name half of the split representation.
pub const KIND_FIELD: &str = "kind";

/// Wire field carrying the version half of the split representation.
pub const VERSION_FIELD: &str = "version";

/// A discriminated payload without a bound concrete type.
#[derive(Debug, Clone)]
pub struct UnstructuredObject {
    discriminator: Discriminator,
    fields: Map<String, Value>,
    raw: Vec<u8>,
    // name of the codec `raw` is valid under
    codec: &'static str,
}

impl UnstructuredObject {
    /// Parses a payload, keeping `raw` as the exact input bytes.
    ///
    /// This is the bootstrap step of polymorphic decoding: it needs no
    /// knowledge of the concrete destination type.
    pub fn parse(raw: &[u8], codec: &dyn Codec) -> Result<Self, DecodeError> {
        let value = codec.unmarshal(raw)?;
        let fields = into_fields(value, codec.name())?;
        let discriminator = discriminator_of(&fields, codec.name())?;
        Ok(UnstructuredObject {
            discriminator,
            fields,
            raw: raw.to_vec(),
            codec: codec.name(),
        })
    }

    /// Builds an unstructured object from an already-parsed value. The
    /// raw bytes are the JSON serialization of the value.
    pub fn from_value(value: Value) -> Result<Self, DecodeError> {
        let fields = into_fields(value, "json")?;
        let discriminator = discriminator_of(&fields, "json")?;
        let raw = encode_fields(&fields)?;
        Ok(UnstructuredObject {
            discriminator,
            fields,
            raw,
            codec: "json",
        })
    }

    /// Converts any serializable typed object into its unstructured form.
    pub fn from_typed<T: Serialize + ?Sized>(obj: &T) -> Result<Self, DecodeError> {
        let value = serde_json::to_value(obj)
            .map_err(|e| DecodeError::malformed("json", e.to_string()))?;
        Self::from_value(value)
    }

    pub fn discriminator(&self) -> &Discriminator {
        &self.discriminator
    }

    /// The serialized payload. Exactly the input bytes if the object has
    /// not been mutated since parsing.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Name of the codec [`raw`](Self::raw) is valid under.
    pub fn codec_name(&self) -> &'static str {
        self.codec
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// The payload as a plain value.
    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    /// Sets a field and recomputes the raw bytes. Touching a
    /// discriminator field re-normalizes the discriminator as well.
    pub fn set_field(
        &mut self,
        name: impl Into<String>,
        value: Value,
    ) -> Result<(), DecodeError> {
        let name = name.into();
        let touches_discriminator =
            matches!(name.as_str(), TYPE_FIELD | KIND_FIELD | VERSION_FIELD);
        self.fields.insert(name, value);
        if touches_discriminator {
            self.discriminator = discriminator_of(&self.fields, self.codec)?;
        }
        self.recompute_raw()
    }

    /// Rewrites the discriminator, mirroring it into whichever wire
    /// representation the payload already uses.
    pub fn set_discriminator(&mut self, discriminator: Discriminator) -> Result<(), DecodeError> {
        if self.fields.contains_key(KIND_FIELD) {
            self.fields.insert(
                KIND_FIELD.to_string(),
                Value::String(discriminator.name().to_string()),
            );
            match discriminator.version() {
                Some(v) => {
                    self.fields
                        .insert(VERSION_FIELD.to_string(), Value::String(v.to_string()));
                }
                None => {
                    self.fields.remove(VERSION_FIELD);
                }
            }
        } else {
            self.fields.insert(
                TYPE_FIELD.to_string(),
                Value::String(discriminator.formatted()),
            );
        }
        self.discriminator = discriminator;
        self.recompute_raw()
    }

    /// Resolves this payload against a scheme. Idempotent; never mutates
    /// the payload.
    pub fn evaluate<T: ?Sized>(&self, scheme: &Scheme<T>) -> Result<Box<T>, DecodeError> {
        let codec = codec::by_name(self.codec).unwrap_or_else(codec::default_codec);
        scheme.decode_with(&self.raw, codec)
    }

    // Mutation re-emits through JSON: the canonical interchange encoding,
    // independent of what the input was parsed from.
    fn recompute_raw(&mut self) -> Result<(), DecodeError> {
        self.raw = encode_fields(&self.fields)?;
        self.codec = "json";
        Ok(())
    }
}

/// Field-map equality; raw formatting differences do not matter.
impl PartialEq for UnstructuredObject {
    fn eq(&self, other: &Self) -> bool {
        self.discriminator == other.discriminator && self.fields == other.fields
    }
}

impl Serialize for UnstructuredObject {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for UnstructuredObject {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        UnstructuredObject::from_value(value).map_err(D::Error::custom)
    }
}

/// Extracts just the discriminator from a serialized payload.
pub fn parse_discriminator(raw: &[u8], codec: &dyn Codec) -> Result<Discriminator, DecodeError> {
    Ok(UnstructuredObject::parse(raw, codec)?.discriminator.clone())
}

fn into_fields(value: Value, codec: &'static str) -> Result<Map<String, Value>, DecodeError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(DecodeError::malformed(
            codec,
            format!("expected an object, found {}", value_kind(&other)),
        )),
    }
}

fn encode_fields(fields: &Map<String, Value>) -> Result<Vec<u8>, DecodeError> {
    serde_json::to_vec(fields).map_err(|e| DecodeError::malformed("json", e.to_string()))
}

fn discriminator_of(
    fields: &Map<String, Value>,
    codec: &'static str,
) -> Result<Discriminator, DecodeError> {
    if let Some(value) = fields.get(TYPE_FIELD) {
        let s = value.as_str().ok_or_else(|| {
            DecodeError::malformed(codec, format!("{} field is not a string", TYPE_FIELD))
        })?;
        if s.is_empty() {
            return Err(DecodeError::MissingDiscriminator);
        }
        return Ok(Discriminator::parse(s));
    }
    if let Some(value) = fields.get(KIND_FIELD) {
        let kind = value.as_str().ok_or_else(|| {
            DecodeError::malformed(codec, format!("{} field is not a string", KIND_FIELD))
        })?;
        if kind.is_empty() {
            return Err(DecodeError::MissingDiscriminator);
        }
        let version = match fields.get(VERSION_FIELD) {
            None | Some(Value::Null) => None,
            Some(value) => Some(value.as_str().ok_or_else(|| {
                DecodeError::malformed(codec, format!("{} field is not a string", VERSION_FIELD))
            })?),
        };
        return Ok(Discriminator::from_fields(kind, version));
    }
    Err(DecodeError::MissingDiscriminator)
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
