//! Deferred-resolution and fallback wrappers.
//!
//! A [`GenericSpec`] decouples "parse" from "resolve": type registration
//! is not guaranteed to be complete when a spec is first materialized
//! (plugins supplying additional discriminators may be discovered after
//! startup code has parsed a configuration file), so evaluation retries
//! against ever-more-complete schemes without re-reading the original
//! bytes. An [`UnknownSpec`] is the terminal form of the same payload:
//! it parses fine and fails only when asked to do something semantic.

use crate::codec::Codec;
use crate::discriminator::Discriminator;
use crate::error::DecodeError;
use crate::scheme::Scheme;
use crate::typed::TypedObject;
use crate::unstructured::UnstructuredObject;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A discriminated payload whose resolution is deferred to the point of
/// use.
#[derive(Debug, Clone, PartialEq)]
pub struct GenericSpec {
    payload: UnstructuredObject,
}

impl GenericSpec {
    pub fn parse(raw: &[u8], codec: &dyn Codec) -> Result<Self, DecodeError> {
        Ok(GenericSpec {
            payload: UnstructuredObject::parse(raw, codec)?,
        })
    }

    pub fn from_unstructured(payload: UnstructuredObject) -> Self {
        GenericSpec { payload }
    }

    pub fn discriminator(&self) -> &Discriminator {
        self.payload.discriminator()
    }

    pub fn payload(&self) -> &UnstructuredObject {
        &self.payload
    }

    pub fn into_payload(self) -> UnstructuredObject {
        self.payload
    }

    /// Resolves against the given scheme, returning whatever its decode
    /// returns: a concrete object, or the scheme's fallback. Idempotent;
    /// may be called repeatedly and against different schemes as more
    /// types become known.
    pub fn evaluate<T: ?Sized>(&self, scheme: &Scheme<T>) -> Result<Box<T>, DecodeError> {
        self.payload.evaluate(scheme)
    }
}

impl TypedObject for GenericSpec {
    fn discriminator(&self) -> Discriminator {
        self.payload.discriminator().clone()
    }

    fn to_unstructured(&self) -> Result<UnstructuredObject, DecodeError> {
        Ok(self.payload.clone())
    }
}

impl Serialize for GenericSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.payload.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for GenericSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(GenericSpec {
            payload: UnstructuredObject::deserialize(deserializer)?,
        })
    }
}

/// The stand-in for a payload whose discriminator has no registered
/// decoder. Parsing succeeded; semantic use fails with
/// [`DecodeError::UnknownType`].
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownSpec {
    payload: UnstructuredObject,
}

impl UnknownSpec {
    pub fn parse(raw: &[u8], codec: &dyn Codec) -> Result<Self, DecodeError> {
        Ok(UnknownSpec {
            payload: UnstructuredObject::parse(raw, codec)?,
        })
    }

    pub fn from_unstructured(payload: UnstructuredObject) -> Self {
        UnknownSpec { payload }
    }

    pub fn discriminator(&self) -> &Discriminator {
        self.payload.discriminator()
    }

    pub fn payload(&self) -> &UnstructuredObject {
        &self.payload
    }

    /// The original bytes, preserved verbatim for re-emission.
    pub fn raw(&self) -> &[u8] {
        self.payload.raw()
    }

    /// The error every semantic family operation reports for this spec.
    pub fn unknown_error(&self) -> DecodeError {
        DecodeError::UnknownType(self.payload.discriminator().clone())
    }
}

impl TypedObject for UnknownSpec {
    fn discriminator(&self) -> Discriminator {
        self.payload.discriminator().clone()
    }

    fn to_unstructured(&self) -> Result<UnstructuredObject, DecodeError> {
        Ok(self.payload.clone())
    }
}

impl Serialize for UnknownSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.payload.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for UnknownSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(UnknownSpec {
            payload: UnstructuredObject::deserialize(deserializer)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{unmarshal_typed, JSON, YAML};
    use crate::scheme::FnDecoder;

    #[derive(Debug, serde::Serialize, serde::Deserialize)]
    struct Plug {
        #[serde(rename = "type")]
        spec_type: String,
        endpoint: String,
    }

    trait PlugLike: Send + Sync {
        fn endpoint(&self) -> String;
    }

    impl PlugLike for Plug {
        fn endpoint(&self) -> String {
            self.endpoint.clone()
        }
    }

    #[test]
    fn test_generic_spec_defers_until_registration() {
        let raw = br#"{"type": "plugin/v1", "endpoint": "unix:///tmp/p.sock"}"#;
        let generic = GenericSpec::parse(raw, &JSON).unwrap();
        assert_eq!(generic.discriminator().to_string(), "plugin/v1");

        let scheme: Scheme<dyn PlugLike> = Scheme::new();
        // unregistered and no default decoder: evaluation fails for now
        assert!(matches!(
            generic.evaluate(&scheme).unwrap_err(),
            DecodeError::UnregisteredType(_)
        ));

        scheme.register(
            Discriminator::versioned("plugin", "v1"),
            FnDecoder::new(|raw, codec| {
                let plug: Plug = unmarshal_typed(raw, codec)?;
                Ok(Box::new(plug) as Box<dyn PlugLike>)
            }),
        );

        // same generic spec, same bytes, now resolvable; and evaluation
        // is repeatable
        for _ in 0..2 {
            let plug = generic.evaluate(&scheme).unwrap();
            assert_eq!(plug.endpoint(), "unix:///tmp/p.sock");
        }
    }

    #[test]
    fn test_generic_spec_parsed_from_yaml_resolves() {
        let raw = b"type: plugin/v1\nendpoint: unix:///tmp/p.sock\n";
        let generic = GenericSpec::parse(raw, &YAML).unwrap();

        let scheme: Scheme<dyn PlugLike> = Scheme::new();
        scheme.register(
            Discriminator::versioned("plugin", "v1"),
            FnDecoder::new(|raw, codec| {
                let plug: Plug = unmarshal_typed(raw, codec)?;
                Ok(Box::new(plug) as Box<dyn PlugLike>)
            }),
        );
        let plug = generic.evaluate(&scheme).unwrap();
        assert_eq!(plug.endpoint(), "unix:///tmp/p.sock");
    }

    #[test]
    fn test_unknown_spec_preserves_bytes_and_fails_on_use() {
        let raw = br#"{"type": "totally/unused", "weird": [1, {"deep": true}]}"#;
        let unknown = UnknownSpec::parse(raw, &JSON).unwrap();
        assert_eq!(unknown.raw(), raw.as_slice());
        match unknown.unknown_error() {
            DecodeError::UnknownType(d) => assert_eq!(d.to_string(), "totally/unused"),
            other => panic!("expected UnknownType, got {other:?}"),
        }
    }
}
