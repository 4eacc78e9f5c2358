//! cdist typed-object runtime.
//!
//! A registry-driven codec for open families of "spec" types: payloads
//! carry a type discriminator, schemes map discriminators to decoders,
//! and payloads naming types unknown to the current binary still parse,
//! round-trip byte-for-byte, and resolve later once the type is
//! registered.
//!
//! The runtime knows nothing about any concrete family; repository
//! specs, access-method specs and config specs all plug in through
//! [`TypedObject`] and per-family [`Scheme`] values constructed by the
//! host application.

pub mod codec;
pub mod discriminator;
pub mod equality;
pub mod error;
pub mod generic;
pub mod scheme;
pub mod typed;
pub mod unstructured;

pub use codec::{Codec, JsonCodec, YamlCodec, JSON, YAML};
pub use discriminator::Discriminator;
pub use equality::{canonical_bytes, typed_objects_equal, unstructured_equal};
pub use error::DecodeError;
pub use generic::{GenericSpec, UnknownSpec};
pub use scheme::{FnDecoder, Registration, Scheme, SpecDecoder};
pub use typed::TypedObject;
pub use unstructured::{parse_discriminator, UnstructuredObject};
