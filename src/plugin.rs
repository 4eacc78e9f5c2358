//! Plugin descriptors and their registration into the type registries.
//!
//! A plugin ships a JSON descriptor declaring which access-method types
//! it supports. Installing the descriptor layers a plugin-local scheme
//! over the base access registry and registers one passthrough decoder
//! per declared type; the payload of such a spec stays unstructured and
//! is handed to the plugin process by the (out-of-scope) executor.
//! Re-installation deliberately replaces earlier bindings; the
//! registration report says which ones were replaced.

use crate::access::{
    AccessContext, AccessError, AccessHandle, AccessSpec, AccessSpecScheme, UnknownAccessSpec,
};
use cdist_runtime::{
    Codec, DecodeError, Discriminator, FnDecoder, Registration, Scheme, TypedObject,
    UnstructuredObject,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Descriptor format version understood by this binary.
pub const DESCRIPTOR_FORMAT_VERSION: &str = "v1";

#[derive(Debug, Error)]
pub enum PluginError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("plugin descriptor carries no plugin name")]
    MissingName,

    #[error("plugin {0} declares no supported types")]
    NoDeclaredTypes(String),

    #[error("unsupported descriptor format {found:?}, expected {expected:?}")]
    UnsupportedFormat { found: String, expected: String },
}

/// One access method a plugin implements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessMethodDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl AccessMethodDescriptor {
    fn discriminator(&self) -> Discriminator {
        Discriminator::from_fields(&self.name, self.version.as_deref())
    }
}

/// Self-description a plugin binary emits when queried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginDescriptor {
    /// Descriptor format version.
    pub version: String,
    pub plugin_name: String,
    pub plugin_version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub short_description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub access_methods: Vec<AccessMethodDescriptor>,
}

impl PluginDescriptor {
    /// Parses and validates a descriptor.
    pub fn parse(raw: &[u8], codec: &dyn Codec) -> Result<Self, PluginError> {
        let descriptor: PluginDescriptor = cdist_runtime::codec::unmarshal_typed(raw, codec)?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    pub fn validate(&self) -> Result<(), PluginError> {
        if self.version != DESCRIPTOR_FORMAT_VERSION {
            return Err(PluginError::UnsupportedFormat {
                found: self.version.clone(),
                expected: DESCRIPTOR_FORMAT_VERSION.to_string(),
            });
        }
        if self.plugin_name.is_empty() {
            return Err(PluginError::MissingName);
        }
        if self.access_methods.is_empty() {
            return Err(PluginError::NoDeclaredTypes(self.plugin_name.clone()));
        }
        Ok(())
    }
}

/// An access spec whose type is implemented by a plugin. The payload
/// stays unstructured; resolution yields a handle naming the plugin
/// responsible for the actual retrieval.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginAccessSpec {
    payload: UnstructuredObject,
    plugin: String,
}

impl PluginAccessSpec {
    pub fn plugin_name(&self) -> &str {
        &self.plugin
    }

    pub fn payload(&self) -> &UnstructuredObject {
        &self.payload
    }
}

impl TypedObject for PluginAccessSpec {
    fn discriminator(&self) -> Discriminator {
        self.payload.discriminator().clone()
    }

    fn to_unstructured(&self) -> Result<UnstructuredObject, DecodeError> {
        Ok(self.payload.clone())
    }
}

impl AccessSpec for PluginAccessSpec {
    fn describe(&self) -> String {
        format!(
            "access method {} (plugin {})",
            self.payload.discriminator(),
            self.plugin
        )
    }

    fn resolve(&self, _ctx: &AccessContext) -> Result<AccessHandle, AccessError> {
        Ok(AccessHandle {
            locator: format!("plugin://{}/{}", self.plugin, self.payload.discriminator()),
            media_type: self
                .payload
                .field("mediaType")
                .and_then(|v| v.as_str())
                .map(str::to_string),
        })
    }
}

/// Outcome of one declared-type registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginRegistration {
    pub discriminator: Discriminator,
    pub outcome: Registration,
}

/// A plugin's descriptor together with the access scheme layered over
/// the base registry.
pub struct InstalledPlugin {
    pub descriptor: PluginDescriptor,
    pub access_types: Arc<AccessSpecScheme>,
    /// Per-type outcome; `Replaced` entries shadowed a prior binding.
    pub registrations: Vec<PluginRegistration>,
}

/// Installs a plugin: builds a scheme layered over `base` and registers
/// a passthrough decoder for every declared access method.
pub fn install_plugin(
    descriptor: PluginDescriptor,
    base: Arc<AccessSpecScheme>,
) -> Result<InstalledPlugin, PluginError> {
    descriptor.validate()?;

    let scheme = Scheme::new()
        .with_base(base)
        .with_default_decoder(FnDecoder::new(|raw, codec| {
            Ok(Box::new(UnknownAccessSpec::parse(raw, codec)?) as Box<dyn AccessSpec>)
        }));

    let mut registrations = Vec::with_capacity(descriptor.access_methods.len());
    for method in &descriptor.access_methods {
        let discriminator = method.discriminator();
        let plugin = descriptor.plugin_name.clone();
        let outcome = scheme.register(
            discriminator.clone(),
            FnDecoder::new(move |raw, codec| {
                let payload = UnstructuredObject::parse(raw, codec)?;
                Ok(Box::new(PluginAccessSpec {
                    payload,
                    plugin: plugin.clone(),
                }) as Box<dyn AccessSpec>)
            }),
        );
        registrations.push(PluginRegistration {
            discriminator,
            outcome,
        });
    }

    Ok(InstalledPlugin {
        descriptor,
        access_types: Arc::new(scheme),
        registrations,
    })
}
