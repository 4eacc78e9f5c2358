//! Registry mapping discriminators to decoders for one type family.
//!
//! A scheme owns its local entry table and holds read-only references to
//! zero or more base schemes. Lookup order is local entries first, then
//! each base in registration order; the first hit wins, so a composed
//! scheme can shadow a base's binding without mutating it. Registration
//! and lookup may race freely: the entry table sits behind a `RwLock`,
//! and base lookups take only the base's own read lock.

use crate::codec::{self, Codec};
use crate::discriminator::Discriminator;
use crate::error::DecodeError;
use crate::typed::TypedObject;
use crate::unstructured::UnstructuredObject;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Family-aware decode logic for one discriminator.
pub trait SpecDecoder<T: ?Sized>: Send + Sync {
    fn decode(&self, raw: &[u8], codec: &dyn Codec) -> Result<Box<T>, DecodeError>;
}

/// A [`SpecDecoder`] built from a closure. The usual registration shape:
///
/// ```ignore
/// scheme.register(
///     Discriminator::versioned("s3", "v1"),
///     FnDecoder::new(|raw, codec| {
///         let spec: S3AccessSpec = codec::unmarshal_typed(raw, codec)?;
///         Ok(Box::new(spec) as Box<dyn AccessSpec>)
///     }),
/// );
/// ```
pub struct FnDecoder<T: ?Sized> {
    decode: Box<dyn Fn(&[u8], &dyn Codec) -> Result<Box<T>, DecodeError> + Send + Sync>,
}

impl<T: ?Sized> FnDecoder<T> {
    pub fn new<F>(decode: F) -> Self
    where
        F: Fn(&[u8], &dyn Codec) -> Result<Box<T>, DecodeError> + Send + Sync + 'static,
    {
        FnDecoder {
            decode: Box::new(decode),
        }
    }
}

impl<T: ?Sized> SpecDecoder<T> for FnDecoder<T> {
    fn decode(&self, raw: &[u8], codec: &dyn Codec) -> Result<Box<T>, DecodeError> {
        (self.decode)(raw, codec)
    }
}

/// Outcome of a [`Scheme::register`] call.
///
/// Re-registering a discriminator overwrites the previous entry; that is
/// intentional (plugin re-configuration replaces a prior binding) and
/// `Replaced` is the diagnostic callers surface when they care.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Inserted,
    Replaced,
}

/// Registry for one family of typed objects, layerable over bases.
pub struct Scheme<T: ?Sized> {
    entries: RwLock<HashMap<Discriminator, Arc<dyn SpecDecoder<T>>>>,
    bases: Vec<Arc<Scheme<T>>>,
    default_decoder: Option<Arc<dyn SpecDecoder<T>>>,
    strict: bool,
    codec: &'static dyn Codec,
}

impl<T: ?Sized> Scheme<T> {
    /// A non-strict scheme with no fallback decoder and the JSON codec.
    pub fn new() -> Self {
        Scheme {
            entries: RwLock::new(HashMap::new()),
            bases: Vec::new(),
            default_decoder: None,
            strict: false,
            codec: codec::default_codec(),
        }
    }

    /// A strict scheme: an unregistered discriminator is a decode error.
    pub fn strict() -> Self {
        Scheme {
            strict: true,
            ..Scheme::new()
        }
    }

    /// Sets the fallback decoder applied when no entry matches.
    /// Conventionally this produces the family's Unknown wrapper.
    pub fn with_default_decoder<D>(mut self, decoder: D) -> Self
    where
        D: SpecDecoder<T> + 'static,
    {
        self.default_decoder = Some(Arc::new(decoder));
        self
    }

    /// Layers this scheme over a base. Bases are consulted in the order
    /// they were added; this scheme's own entries always win.
    pub fn with_base(mut self, base: Arc<Scheme<T>>) -> Self {
        self.bases.push(base);
        self
    }

    /// Sets the codec used by [`decode`](Self::decode) and
    /// [`convert`](Self::convert).
    pub fn with_codec(mut self, codec: &'static dyn Codec) -> Self {
        self.codec = codec;
        self
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn codec(&self) -> &'static dyn Codec {
        self.codec
    }

    /// Registers a decoder, overwriting any existing entry for the exact
    /// discriminator. Last registration wins.
    pub fn register<D>(&self, discriminator: Discriminator, decoder: D) -> Registration
    where
        D: SpecDecoder<T> + 'static,
    {
        self.register_arc(discriminator, Arc::new(decoder))
    }

    pub fn register_arc(
        &self,
        discriminator: Discriminator,
        decoder: Arc<dyn SpecDecoder<T>>,
    ) -> Registration {
        let mut entries = self.entries.write().unwrap();
        match entries.insert(discriminator, decoder) {
            Some(_) => Registration::Replaced,
            None => Registration::Inserted,
        }
    }

    /// Looks up a decoder: local entries, then bases in order.
    pub fn lookup(&self, discriminator: &Discriminator) -> Option<Arc<dyn SpecDecoder<T>>> {
        if let Some(decoder) = self.entries.read().unwrap().get(discriminator) {
            return Some(Arc::clone(decoder));
        }
        self.bases
            .iter()
            .find_map(|base| base.lookup(discriminator))
    }

    pub fn has_decoder(&self, discriminator: &Discriminator) -> bool {
        self.lookup(discriminator).is_some()
    }

    /// Every discriminator this scheme resolves, bases included, sorted.
    pub fn known_types(&self) -> Vec<Discriminator> {
        let mut known: Vec<Discriminator> =
            self.entries.read().unwrap().keys().cloned().collect();
        for base in &self.bases {
            known.extend(base.known_types());
        }
        known.sort();
        known.dedup();
        known
    }

    /// Decodes a payload with the scheme's codec.
    pub fn decode(&self, raw: &[u8]) -> Result<Box<T>, DecodeError> {
        self.decode_with(raw, self.codec)
    }

    /// Decodes a payload: extract the discriminator, find a decoder, and
    /// run it. With no match: strict mode fails with `UnregisteredType`,
    /// otherwise the default decoder applies (and its absence is also
    /// `UnregisteredType`).
    pub fn decode_with(&self, raw: &[u8], codec: &dyn Codec) -> Result<Box<T>, DecodeError> {
        let payload = UnstructuredObject::parse(raw, codec)?;
        let discriminator = payload.discriminator().clone();
        if let Some(decoder) = self.lookup(&discriminator) {
            return decoder.decode(raw, codec);
        }
        if self.strict {
            return Err(DecodeError::UnregisteredType(discriminator));
        }
        match &self.default_decoder {
            Some(decoder) => decoder.decode(raw, codec),
            None => Err(DecodeError::UnregisteredType(discriminator)),
        }
    }

    /// Normalizes a foreign family member into this scheme's concrete
    /// type by a marshal-then-decode round trip.
    pub fn convert<S: TypedObject>(&self, obj: &S) -> Result<Box<T>, DecodeError> {
        self.convert_unstructured(&obj.to_unstructured()?)
    }

    /// [`convert`](Self::convert) for an already-unstructured payload;
    /// also the entry point for unsized family members, which reach the
    /// unstructured form through their own `to_unstructured`.
    pub fn convert_unstructured(
        &self,
        payload: &UnstructuredObject,
    ) -> Result<Box<T>, DecodeError> {
        let codec = codec::by_name(payload.codec_name()).unwrap_or_else(codec::default_codec);
        self.decode_with(payload.raw(), codec)
    }
}

impl<T: ?Sized> Default for Scheme<T> {
    fn default() -> Self {
        Scheme::new()
    }
}

impl<T: ?Sized> std::fmt::Debug for Scheme<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheme")
            .field("known_types", &self.known_types())
            .field("bases", &self.bases.len())
            .field("strict", &self.strict)
            .field("codec", &self.codec.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::unmarshal_typed;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Leaf {
        #[serde(rename = "type")]
        spec_type: String,
        label: String,
    }

    trait Node: Send + Sync {
        fn label(&self) -> String;
    }

    impl Node for Leaf {
        fn label(&self) -> String {
            self.label.clone()
        }
    }

    impl TypedObject for Leaf {
        fn discriminator(&self) -> Discriminator {
            Discriminator::parse(&self.spec_type)
        }

        fn to_unstructured(&self) -> Result<UnstructuredObject, DecodeError> {
            UnstructuredObject::from_typed(self)
        }
    }

    fn leaf_decoder(tag: &'static str) -> FnDecoder<dyn Node> {
        FnDecoder::new(move |raw, codec| {
            let mut leaf: Leaf = unmarshal_typed(raw, codec)?;
            leaf.label = format!("{}:{}", tag, leaf.label);
            Ok(Box::new(leaf) as Box<dyn Node>)
        })
    }

    #[test]
    fn test_register_and_decode() {
        let scheme: Scheme<dyn Node> = Scheme::new();
        scheme.register(Discriminator::versioned("leaf", "v1"), leaf_decoder("d"));

        let node = scheme.decode(br#"{"type": "leaf/v1", "label": "a"}"#).unwrap();
        assert_eq!(node.label(), "d:a");
    }

    #[test]
    fn test_registration_reports_replacement() {
        let scheme: Scheme<dyn Node> = Scheme::new();
        let d = Discriminator::versioned("leaf", "v1");
        assert_eq!(
            scheme.register(d.clone(), leaf_decoder("first")),
            Registration::Inserted
        );
        assert_eq!(
            scheme.register(d.clone(), leaf_decoder("second")),
            Registration::Replaced
        );

        // last registration wins
        let node = scheme.decode(br#"{"type": "leaf/v1", "label": "a"}"#).unwrap();
        assert_eq!(node.label(), "second:a");
    }

    #[test]
    fn test_unregistered_type_without_default_decoder() {
        let scheme: Scheme<dyn Node> = Scheme::new();
        let err = scheme.decode(br#"{"type": "leaf/v1"}"#).unwrap_err();
        assert!(matches!(err, DecodeError::UnregisteredType(_)));
    }

    #[test]
    fn test_strict_mode_rejects_unregistered() {
        let scheme: Scheme<dyn Node> = Scheme::strict().with_default_decoder(leaf_decoder("x"));
        let err = scheme
            .decode(br#"{"type": "ghost/v1", "label": "a"}"#)
            .unwrap_err();
        match err {
            DecodeError::UnregisteredType(d) => assert_eq!(d.to_string(), "ghost/v1"),
            other => panic!("expected UnregisteredType, got {other:?}"),
        }
    }

    #[test]
    fn test_base_lookup_and_local_shadowing() {
        let base: Arc<Scheme<dyn Node>> = Arc::new(Scheme::new());
        base.register(Discriminator::versioned("a", "v1"), leaf_decoder("base"));
        base.register(Discriminator::versioned("b", "v1"), leaf_decoder("base"));

        let composed: Scheme<dyn Node> = Scheme::new().with_base(Arc::clone(&base));
        composed.register(Discriminator::versioned("a", "v1"), leaf_decoder("local"));

        let a = composed.decode(br#"{"type": "a/v1", "label": "x"}"#).unwrap();
        assert_eq!(a.label(), "local:x", "local entry must shadow the base");

        let b = composed.decode(br#"{"type": "b/v1", "label": "x"}"#).unwrap();
        assert_eq!(b.label(), "base:x", "base entry must be reachable");

        // shadowing never mutated the base
        let a_base = base.decode(br#"{"type": "a/v1", "label": "x"}"#).unwrap();
        assert_eq!(a_base.label(), "base:x");
    }

    #[test]
    fn test_bases_consulted_in_order() {
        let first: Arc<Scheme<dyn Node>> = Arc::new(Scheme::new());
        first.register(Discriminator::new("t"), leaf_decoder("first"));
        let second: Arc<Scheme<dyn Node>> = Arc::new(Scheme::new());
        second.register(Discriminator::new("t"), leaf_decoder("second"));

        let composed: Scheme<dyn Node> = Scheme::new().with_base(first).with_base(second);
        let node = composed.decode(br#"{"type": "t", "label": "x"}"#).unwrap();
        assert_eq!(node.label(), "first:x");
    }

    #[test]
    fn test_known_types_spans_bases() {
        let base: Arc<Scheme<dyn Node>> = Arc::new(Scheme::new());
        base.register(Discriminator::new("b"), leaf_decoder("base"));
        let composed: Scheme<dyn Node> = Scheme::new().with_base(base);
        composed.register(Discriminator::new("a"), leaf_decoder("local"));

        let names: Vec<String> = composed
            .known_types()
            .iter()
            .map(|d| d.to_string())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_default_decoder_applies_on_miss() {
        let scheme: Scheme<dyn Node> =
            Scheme::new().with_default_decoder(FnDecoder::new(|raw, codec| {
                let payload = UnstructuredObject::parse(raw, codec)?;
                Ok(Box::new(Leaf {
                    spec_type: payload.discriminator().formatted(),
                    label: "fallback".into(),
                }) as Box<dyn Node>)
            }));
        let node = scheme.decode(br#"{"type": "ghost/v1"}"#).unwrap();
        assert_eq!(node.label(), "fallback");
    }

    #[test]
    fn test_decode_propagates_parse_failures() {
        let scheme: Scheme<dyn Node> = Scheme::new().with_default_decoder(leaf_decoder("x"));
        assert!(matches!(
            scheme.decode(b"{oops").unwrap_err(),
            DecodeError::MalformedPayload { .. }
        ));
        assert!(matches!(
            scheme.decode(br#"{"label": "no type"}"#).unwrap_err(),
            DecodeError::MissingDiscriminator
        ));
    }

    #[test]
    fn test_convert_round_trips_concrete_value() {
        let scheme: Scheme<dyn Node> = Scheme::new();
        scheme.register(Discriminator::versioned("leaf", "v1"), leaf_decoder(""));

        let leaf = Leaf {
            spec_type: "leaf/v1".into(),
            label: "z".into(),
        };
        let node = scheme.convert(&leaf).unwrap();
        assert_eq!(node.label(), ":z");
    }

    #[test]
    fn test_concurrent_register_and_decode() {
        use std::thread;

        let scheme: Arc<Scheme<dyn Node>> = Arc::new(
            Scheme::new().with_default_decoder(FnDecoder::new(|raw, codec| {
                let payload = UnstructuredObject::parse(raw, codec)?;
                Ok(Box::new(Leaf {
                    spec_type: payload.discriminator().formatted(),
                    label: "fallback".into(),
                }) as Box<dyn Node>)
            })),
        );

        let writer = {
            let scheme = Arc::clone(&scheme);
            thread::spawn(move || {
                for i in 0..100 {
                    scheme.register(
                        Discriminator::versioned(format!("t{i}"), "v1"),
                        leaf_decoder("w"),
                    );
                }
            })
        };
        let reader = {
            let scheme = Arc::clone(&scheme);
            thread::spawn(move || {
                for _ in 0..100 {
                    let node = scheme
                        .decode(br#"{"type": "t0/v1", "label": "a"}"#)
                        .unwrap();
                    // either the fallback (not yet registered) or the entry
                    let label = node.label();
                    assert!(label == "fallback" || label == "w:a");
                }
            })
        };
        writer.join().unwrap();
        reader.join().unwrap();
    }
}
