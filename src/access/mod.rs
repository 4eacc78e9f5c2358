//! Access-method spec family.
//!
//! An access spec describes how the bytes of a single artifact are
//! obtained: from the component archive itself, from an OCI registry,
//! from an object store, or through a plugin-provided method. Like the
//! repository family it is open; plugins layer their methods over the
//! base registry at runtime.

mod localblob;
mod ociartifact;
mod s3;

pub use localblob::LocalBlobAccessSpec;
pub use ociartifact::OciArtifactAccessSpec;
pub use s3::S3AccessSpec;

use cdist_runtime::codec::unmarshal_typed;
use cdist_runtime::{
    DecodeError, Discriminator, FnDecoder, GenericSpec, Scheme, TypedObject, UnknownSpec,
    UnstructuredObject,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Type name for blobs stored inside the component archive.
pub const LOCAL_BLOB_TYPE: &str = "localBlob";

/// Type name for artifacts referenced in an OCI registry.
pub const OCI_ARTIFACT_TYPE: &str = "ociArtifact";

/// Type name for objects in an S3-compatible store.
pub const S3_TYPE: &str = "s3";

#[derive(Debug, Error)]
pub enum AccessError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("incomplete {spec_type} access spec: {reason}")]
    IncompleteSpec {
        spec_type: Discriminator,
        reason: String,
    },
}

/// Resolved retrieval parameters for one artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessHandle {
    /// Normalized locator for the artifact bytes.
    pub locator: String,
    /// Declared media type, when the spec carries one.
    pub media_type: Option<String>,
}

/// Contract for all access-method specs.
pub trait AccessSpec: TypedObject + std::fmt::Debug {
    /// One-line human description of the method.
    fn describe(&self) -> String;

    /// Whether the artifact lives inside the component archive itself.
    fn is_local(&self) -> bool {
        false
    }

    /// Resolves the spec into retrieval parameters.
    fn resolve(&self, ctx: &AccessContext) -> Result<AccessHandle, AccessError>;
}

pub type AccessSpecScheme = Scheme<dyn AccessSpec>;

/// Carries the access-method registry to every resolution site.
#[derive(Debug, Clone)]
pub struct AccessContext {
    types: Arc<AccessSpecScheme>,
}

impl AccessContext {
    pub fn new(types: Arc<AccessSpecScheme>) -> Self {
        AccessContext { types }
    }

    pub fn types(&self) -> &AccessSpecScheme {
        &self.types
    }

    pub fn types_arc(&self) -> Arc<AccessSpecScheme> {
        Arc::clone(&self.types)
    }

    pub fn decode(&self, raw: &[u8]) -> Result<Box<dyn AccessSpec>, DecodeError> {
        self.types.decode(raw)
    }

    pub fn normalize(&self, spec: &dyn AccessSpec) -> Result<Box<dyn AccessSpec>, DecodeError> {
        self.types.convert_unstructured(&spec.to_unstructured()?)
    }
}

/// An access spec with deferred type resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenericAccessSpec {
    inner: GenericSpec,
}

impl GenericAccessSpec {
    pub fn parse(raw: &[u8], codec: &dyn cdist_runtime::Codec) -> Result<Self, DecodeError> {
        Ok(GenericAccessSpec {
            inner: GenericSpec::parse(raw, codec)?,
        })
    }

    pub fn from_unstructured(payload: UnstructuredObject) -> Self {
        GenericAccessSpec {
            inner: GenericSpec::from_unstructured(payload),
        }
    }

    pub fn evaluate(&self, ctx: &AccessContext) -> Result<Box<dyn AccessSpec>, DecodeError> {
        self.inner.evaluate(ctx.types())
    }
}

impl TypedObject for GenericAccessSpec {
    fn discriminator(&self) -> Discriminator {
        self.inner.discriminator().clone()
    }

    fn to_unstructured(&self) -> Result<UnstructuredObject, DecodeError> {
        Ok(self.inner.payload().clone())
    }
}

impl AccessSpec for GenericAccessSpec {
    fn describe(&self) -> String {
        format!("deferred access method {}", self.inner.discriminator())
    }

    fn resolve(&self, ctx: &AccessContext) -> Result<AccessHandle, AccessError> {
        self.evaluate(ctx)?.resolve(ctx)
    }
}

/// Fallback for access types with no registered decoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnknownAccessSpec {
    inner: UnknownSpec,
}

impl UnknownAccessSpec {
    pub fn parse(raw: &[u8], codec: &dyn cdist_runtime::Codec) -> Result<Self, DecodeError> {
        Ok(UnknownAccessSpec {
            inner: UnknownSpec::parse(raw, codec)?,
        })
    }

    pub fn raw(&self) -> &[u8] {
        self.inner.raw()
    }
}

impl TypedObject for UnknownAccessSpec {
    fn discriminator(&self) -> Discriminator {
        self.inner.discriminator().clone()
    }

    fn to_unstructured(&self) -> Result<UnstructuredObject, DecodeError> {
        Ok(self.inner.payload().clone())
    }
}

impl AccessSpec for UnknownAccessSpec {
    fn describe(&self) -> String {
        format!("unknown access method {}", self.inner.discriminator())
    }

    fn resolve(&self, _ctx: &AccessContext) -> Result<AccessHandle, AccessError> {
        Err(self.inner.unknown_error().into())
    }
}

/// The default access-method registry with built-in types and the
/// unknown fallback.
pub fn default_access_scheme() -> Arc<AccessSpecScheme> {
    let scheme = Scheme::new().with_default_decoder(FnDecoder::new(|raw, codec| {
        Ok(Box::new(UnknownAccessSpec::parse(raw, codec)?) as Box<dyn AccessSpec>)
    }));
    register_builtin_access_types(&scheme);
    Arc::new(scheme)
}

pub fn strict_access_scheme() -> Arc<AccessSpecScheme> {
    let scheme = Scheme::strict();
    register_builtin_access_types(&scheme);
    Arc::new(scheme)
}

pub fn register_builtin_access_types(scheme: &AccessSpecScheme) {
    for d in [
        Discriminator::new(LOCAL_BLOB_TYPE),
        Discriminator::versioned(LOCAL_BLOB_TYPE, "v1"),
    ] {
        scheme.register(
            d,
            FnDecoder::new(|raw, codec| {
                let spec: LocalBlobAccessSpec = unmarshal_typed(raw, codec)?;
                Ok(Box::new(spec) as Box<dyn AccessSpec>)
            }),
        );
    }
    for d in [
        Discriminator::new(OCI_ARTIFACT_TYPE),
        Discriminator::versioned(OCI_ARTIFACT_TYPE, "v1"),
    ] {
        scheme.register(
            d,
            FnDecoder::new(|raw, codec| {
                let spec: OciArtifactAccessSpec = unmarshal_typed(raw, codec)?;
                Ok(Box::new(spec) as Box<dyn AccessSpec>)
            }),
        );
    }
    for d in [
        Discriminator::new(S3_TYPE),
        Discriminator::versioned(S3_TYPE, "v1"),
    ] {
        scheme.register(
            d,
            FnDecoder::new(|raw, codec| {
                let spec: S3AccessSpec = unmarshal_typed(raw, codec)?;
                Ok(Box::new(spec) as Box<dyn AccessSpec>)
            }),
        );
    }
}

/// Canonical equality for access specs.
pub fn access_specs_equal(a: &dyn AccessSpec, b: &dyn AccessSpec) -> bool {
    match (a.to_unstructured(), b.to_unstructured()) {
        (Ok(a), Ok(b)) => cdist_runtime::unstructured_equal(&a, &b),
        _ => false,
    }
}
