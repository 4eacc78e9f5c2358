//! Repository spec family.
//!
//! A repository spec describes where component artifacts live. The
//! family is open: besides the built-in OCI-registry and common
//! transport formats, plugins and newer producers may introduce types
//! this binary has never seen; those survive as generic or unknown
//! specs and only fail when actually opened.

mod ctf;
mod ocireg;

pub use ctf::{CommonTransportRepositorySpec, FileFormat};
pub use ocireg::OciRegistryRepositorySpec;

use cdist_runtime::codec::unmarshal_typed;
use cdist_runtime::{
    DecodeError, Discriminator, FnDecoder, GenericSpec, Scheme, TypedObject, UnknownSpec,
    UnstructuredObject,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Type name for OCI registry repositories.
pub const OCI_REGISTRY_TYPE: &str = "ociRegistry";

/// Historical alias for [`OCI_REGISTRY_TYPE`], still accepted on input.
pub const OCI_REGISTRY_TYPE_ALIAS: &str = "OCIRegistry";

/// Type name for file-system based common transport archives.
pub const COMMON_TRANSPORT_TYPE: &str = "CommonTransportFormat";

/// Errors from repository spec operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("invalid repository locator {locator:?}: {reason}")]
    InvalidLocator { locator: String, reason: String },
}

/// Resolved connection parameters for a repository. Transports consume
/// this; producing one is the family's semantic operation.
#[derive(Debug, Clone, PartialEq)]
pub struct RepositoryHandle {
    /// Normalized locator (registry host + path, or archive path).
    pub locator: String,
    /// The spec type the handle was resolved from.
    pub spec_type: Discriminator,
}

/// Contract for all repository specs.
pub trait RepositorySpec: TypedObject + std::fmt::Debug {
    /// Stable display name for diagnostics.
    fn name(&self) -> String;

    /// Resolves the spec into connection parameters.
    fn open(&self, ctx: &RepositoryContext) -> Result<RepositoryHandle, RepositoryError>;
}

pub type RepositorySpecScheme = Scheme<dyn RepositorySpec>;

/// Carries the repository type registry to every resolution site; the
/// host application builds one and threads it through explicitly.
#[derive(Debug, Clone)]
pub struct RepositoryContext {
    types: Arc<RepositorySpecScheme>,
}

impl RepositoryContext {
    pub fn new(types: Arc<RepositorySpecScheme>) -> Self {
        RepositoryContext { types }
    }

    pub fn types(&self) -> &RepositorySpecScheme {
        &self.types
    }

    pub fn types_arc(&self) -> Arc<RepositorySpecScheme> {
        Arc::clone(&self.types)
    }

    /// Decodes a serialized repository spec with the registry's codec.
    pub fn decode(&self, raw: &[u8]) -> Result<Box<dyn RepositorySpec>, DecodeError> {
        self.types.decode(raw)
    }

    /// Normalizes a foreign family member (for example a generic spec
    /// produced elsewhere) into this registry's concrete type.
    pub fn normalize(
        &self,
        spec: &dyn RepositorySpec,
    ) -> Result<Box<dyn RepositorySpec>, DecodeError> {
        self.types.convert_unstructured(&spec.to_unstructured()?)
    }
}

/// A repository spec with deferred type resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenericRepositorySpec {
    inner: GenericSpec,
}

impl GenericRepositorySpec {
    pub fn parse(raw: &[u8], codec: &dyn cdist_runtime::Codec) -> Result<Self, DecodeError> {
        Ok(GenericRepositorySpec {
            inner: GenericSpec::parse(raw, codec)?,
        })
    }

    pub fn from_unstructured(payload: UnstructuredObject) -> Self {
        GenericRepositorySpec {
            inner: GenericSpec::from_unstructured(payload),
        }
    }

    /// Re-resolves against the context's current registry. Repeatable;
    /// later plugin registrations make previously unresolvable specs
    /// concrete.
    pub fn evaluate(
        &self,
        ctx: &RepositoryContext,
    ) -> Result<Box<dyn RepositorySpec>, DecodeError> {
        self.inner.evaluate(ctx.types())
    }
}

/// Converts any repository spec into its generic form.
pub fn to_generic_repository_spec(
    spec: &dyn RepositorySpec,
) -> Result<GenericRepositorySpec, DecodeError> {
    Ok(GenericRepositorySpec {
        inner: GenericSpec::from_unstructured(spec.to_unstructured()?),
    })
}

impl TypedObject for GenericRepositorySpec {
    fn discriminator(&self) -> Discriminator {
        self.inner.discriminator().clone()
    }

    fn to_unstructured(&self) -> Result<UnstructuredObject, DecodeError> {
        Ok(self.inner.payload().clone())
    }
}

impl RepositorySpec for GenericRepositorySpec {
    fn name(&self) -> String {
        format!("generic-{}", self.inner.discriminator().name())
    }

    fn open(&self, ctx: &RepositoryContext) -> Result<RepositoryHandle, RepositoryError> {
        self.evaluate(ctx)?.open(ctx)
    }
}

/// Fallback for repository types with no registered decoder. Parses
/// fine; opening fails with the unknown-type error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnknownRepositorySpec {
    inner: UnknownSpec,
}

impl UnknownRepositorySpec {
    pub fn parse(raw: &[u8], codec: &dyn cdist_runtime::Codec) -> Result<Self, DecodeError> {
        Ok(UnknownRepositorySpec {
            inner: UnknownSpec::parse(raw, codec)?,
        })
    }

    /// The original payload bytes, re-emittable verbatim.
    pub fn raw(&self) -> &[u8] {
        self.inner.raw()
    }
}

impl TypedObject for UnknownRepositorySpec {
    fn discriminator(&self) -> Discriminator {
        self.inner.discriminator().clone()
    }

    fn to_unstructured(&self) -> Result<UnstructuredObject, DecodeError> {
        Ok(self.inner.payload().clone())
    }
}

impl RepositorySpec for UnknownRepositorySpec {
    fn name(&self) -> String {
        format!("unknown-{}", self.inner.discriminator().name())
    }

    fn open(&self, _ctx: &RepositoryContext) -> Result<RepositoryHandle, RepositoryError> {
        Err(self.inner.unknown_error().into())
    }
}

/// The default repository registry: built-in types plus the unknown
/// fallback for everything else.
pub fn default_repository_scheme() -> Arc<RepositorySpecScheme> {
    let scheme = Scheme::new().with_default_decoder(FnDecoder::new(|raw, codec| {
        Ok(Box::new(UnknownRepositorySpec::parse(raw, codec)?) as Box<dyn RepositorySpec>)
    }));
    register_builtin_repository_types(&scheme);
    Arc::new(scheme)
}

/// A strict variant: unregistered repository types fail at decode time.
pub fn strict_repository_scheme() -> Arc<RepositorySpecScheme> {
    let scheme = Scheme::strict();
    register_builtin_repository_types(&scheme);
    Arc::new(scheme)
}

/// Registers the built-in repository types, each under its bare kind
/// and its `/v1` form.
pub fn register_builtin_repository_types(scheme: &RepositorySpecScheme) {
    for kind in [OCI_REGISTRY_TYPE, OCI_REGISTRY_TYPE_ALIAS] {
        for d in [
            Discriminator::new(kind),
            Discriminator::versioned(kind, "v1"),
        ] {
            scheme.register(
                d,
                FnDecoder::new(|raw, codec| {
                    let spec: OciRegistryRepositorySpec = unmarshal_typed(raw, codec)?;
                    Ok(Box::new(spec) as Box<dyn RepositorySpec>)
                }),
            );
        }
    }
    for d in [
        Discriminator::new(COMMON_TRANSPORT_TYPE),
        Discriminator::versioned(COMMON_TRANSPORT_TYPE, "v1"),
    ] {
        scheme.register(
            d,
            FnDecoder::new(|raw, codec| {
                let spec: CommonTransportRepositorySpec = unmarshal_typed(raw, codec)?;
                Ok(Box::new(spec) as Box<dyn RepositorySpec>)
            }),
        );
    }
}

/// Canonical equality for repository specs.
pub fn repository_specs_equal(a: &dyn RepositorySpec, b: &dyn RepositorySpec) -> bool {
    match (a.to_unstructured(), b.to_unstructured()) {
        (Ok(a), Ok(b)) => cdist_runtime::unstructured_equal(&a, &b),
        _ => false,
    }
}
