//! Config spec family and the context configs apply to.
//!
//! Configuration is itself distributed as discriminated payloads: a
//! config document is a collection of typed config specs, each applied
//! to the process-wide [`ConfigContext`]. Members whose type is not yet
//! registered are not an error; they are deferred and retried once more
//! types (usually plugin-supplied) become known.

mod attrs;
mod collection;
mod credentials;
mod file;

pub use attrs::AttributesConfigSpec;
pub use collection::ConfigCollectionSpec;
pub use credentials::{ConsumerRule, CredentialsConfigSpec};
pub use file::{load_config_bytes, load_config_file, ConfigOrigin, ConfigSource, LoadedConfig};

use cdist_runtime::codec::unmarshal_typed;
use cdist_runtime::{
    DecodeError, Discriminator, FnDecoder, GenericSpec, Scheme, TypedObject, UnknownSpec,
    UnstructuredObject,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Type name of the credentials config spec.
pub const CREDENTIALS_CONFIG_TYPE: &str = "credentials.config.cdist";

/// Type name of the attributes config spec.
pub const ATTRIBUTES_CONFIG_TYPE: &str = "attributes.config.cdist";

/// Type name of the top-level config collection document.
pub const GENERIC_CONFIG_TYPE: &str = "generic.config.cdist";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("unable to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Contract for all config specs.
pub trait ConfigSpec: TypedObject + std::fmt::Debug {
    fn apply_to(&self, ctx: &mut ConfigContext) -> Result<(), ConfigError>;
}

pub type ConfigSpecScheme = Scheme<dyn ConfigSpec>;

/// Aggregated configuration state plus the config type registry.
///
/// The host application constructs one and threads it through; there is
/// no process-global instance.
pub struct ConfigContext {
    types: Arc<ConfigSpecScheme>,
    attributes: Map<String, Value>,
    consumers: Vec<ConsumerRule>,
    deferred: Vec<GenericConfigSpec>,
}

impl ConfigContext {
    pub fn new(types: Arc<ConfigSpecScheme>) -> Self {
        ConfigContext {
            types,
            attributes: Map::new(),
            consumers: Vec::new(),
            deferred: Vec::new(),
        }
    }

    pub fn types(&self) -> &ConfigSpecScheme {
        &self.types
    }

    pub fn types_arc(&self) -> Arc<ConfigSpecScheme> {
        Arc::clone(&self.types)
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: Value) {
        self.attributes.insert(name.into(), value);
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    pub fn add_consumer(&mut self, rule: ConsumerRule) {
        self.consumers.push(rule);
    }

    pub fn consumers(&self) -> &[ConsumerRule] {
        &self.consumers
    }

    /// Finds the credential properties for a consumer identity. A rule
    /// matches when all of its identity attributes are present in the
    /// queried identity; the first match wins.
    pub fn credentials_for(
        &self,
        identity: &BTreeMap<String, String>,
    ) -> Option<&BTreeMap<String, String>> {
        self.consumers
            .iter()
            .find(|rule| {
                rule.identity
                    .iter()
                    .all(|(k, v)| identity.get(k) == Some(v))
            })
            .map(|rule| &rule.credentials)
    }

    /// Applies a config spec. An unknown-typed spec is not an error
    /// here: it is parked and retried by
    /// [`apply_deferred`](Self::apply_deferred) once its type appears.
    pub fn apply(&mut self, spec: &dyn ConfigSpec) -> Result<(), ConfigError> {
        match spec.apply_to(self) {
            Err(ConfigError::Decode(DecodeError::UnknownType(_))) => {
                let payload = spec.to_unstructured()?;
                self.deferred
                    .push(GenericConfigSpec::from_unstructured(payload));
                Ok(())
            }
            other => other,
        }
    }

    /// Config specs parked because their type had no decoder yet.
    pub fn deferred(&self) -> &[GenericConfigSpec] {
        &self.deferred
    }

    /// Retries parked specs against the current registry. Returns how
    /// many were applied; the rest stay parked.
    pub fn apply_deferred(&mut self) -> Result<usize, ConfigError> {
        let pending = std::mem::take(&mut self.deferred);
        let mut applied = 0;
        for generic in pending {
            if self.types.has_decoder(generic.discriminator()) {
                generic.apply_to(self)?;
                applied += 1;
            } else {
                self.deferred.push(generic);
            }
        }
        Ok(applied)
    }
}

impl std::fmt::Debug for ConfigContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigContext")
            .field("attributes", &self.attributes.len())
            .field("consumers", &self.consumers.len())
            .field("deferred", &self.deferred.len())
            .finish()
    }
}

/// A config spec with deferred type resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenericConfigSpec {
    inner: GenericSpec,
}

impl GenericConfigSpec {
    pub fn parse(raw: &[u8], codec: &dyn cdist_runtime::Codec) -> Result<Self, DecodeError> {
        Ok(GenericConfigSpec {
            inner: GenericSpec::parse(raw, codec)?,
        })
    }

    pub fn from_unstructured(payload: UnstructuredObject) -> Self {
        GenericConfigSpec {
            inner: GenericSpec::from_unstructured(payload),
        }
    }

    pub fn discriminator(&self) -> &Discriminator {
        self.inner.discriminator()
    }
}

impl TypedObject for GenericConfigSpec {
    fn discriminator(&self) -> Discriminator {
        self.inner.discriminator().clone()
    }

    fn to_unstructured(&self) -> Result<UnstructuredObject, DecodeError> {
        Ok(self.inner.payload().clone())
    }
}

impl ConfigSpec for GenericConfigSpec {
    fn apply_to(&self, ctx: &mut ConfigContext) -> Result<(), ConfigError> {
        let types = ctx.types_arc();
        let spec = self.inner.evaluate(&types)?;
        spec.apply_to(ctx)
    }
}

/// Fallback for config types with no registered decoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnknownConfigSpec {
    inner: UnknownSpec,
}

impl UnknownConfigSpec {
    pub fn parse(raw: &[u8], codec: &dyn cdist_runtime::Codec) -> Result<Self, DecodeError> {
        Ok(UnknownConfigSpec {
            inner: UnknownSpec::parse(raw, codec)?,
        })
    }
}

impl TypedObject for UnknownConfigSpec {
    fn discriminator(&self) -> Discriminator {
        self.inner.discriminator().clone()
    }

    fn to_unstructured(&self) -> Result<UnstructuredObject, DecodeError> {
        Ok(self.inner.payload().clone())
    }
}

impl ConfigSpec for UnknownConfigSpec {
    fn apply_to(&self, _ctx: &mut ConfigContext) -> Result<(), ConfigError> {
        Err(self.inner.unknown_error().into())
    }
}

/// The default config registry with built-in types and the unknown
/// fallback.
pub fn default_config_scheme() -> Arc<ConfigSpecScheme> {
    let scheme = Scheme::new().with_default_decoder(FnDecoder::new(|raw, codec| {
        Ok(Box::new(UnknownConfigSpec::parse(raw, codec)?) as Box<dyn ConfigSpec>)
    }));
    register_builtin_config_types(&scheme);
    Arc::new(scheme)
}

pub fn register_builtin_config_types(scheme: &ConfigSpecScheme) {
    for d in [
        Discriminator::parse(CREDENTIALS_CONFIG_TYPE),
        Discriminator::versioned(CREDENTIALS_CONFIG_TYPE, "v1"),
    ] {
        scheme.register(
            d,
            FnDecoder::new(|raw, codec| {
                let spec: CredentialsConfigSpec = unmarshal_typed(raw, codec)?;
                Ok(Box::new(spec) as Box<dyn ConfigSpec>)
            }),
        );
    }
    for d in [
        Discriminator::parse(ATTRIBUTES_CONFIG_TYPE),
        Discriminator::versioned(ATTRIBUTES_CONFIG_TYPE, "v1"),
    ] {
        scheme.register(
            d,
            FnDecoder::new(|raw, codec| {
                let spec: AttributesConfigSpec = unmarshal_typed(raw, codec)?;
                Ok(Box::new(spec) as Box<dyn ConfigSpec>)
            }),
        );
    }
    for d in [
        Discriminator::parse(GENERIC_CONFIG_TYPE),
        Discriminator::versioned(GENERIC_CONFIG_TYPE, "v1"),
    ] {
        scheme.register(
            d,
            FnDecoder::new(|raw, codec| {
                let spec: ConfigCollectionSpec = unmarshal_typed(raw, codec)?;
                Ok(Box::new(spec) as Box<dyn ConfigSpec>)
            }),
        );
    }
}
