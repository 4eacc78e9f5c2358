//! The top-level config document: a typed collection of config specs.
//!
//! The collection is itself a config spec, so documents nest and a
//! whole config file is applied with one `ctx.apply(..)` call. Members
//! stay unstructured until application time; a member with an
//! unregistered type is parked, not rejected, so configuration written
//! for a newer binary (or for a plugin not yet discovered) loads
//! cleanly.

use super::{ConfigContext, ConfigError, ConfigSpec};
use cdist_runtime::{DecodeError, Discriminator, TypedObject, UnstructuredObject};
use serde::{Deserialize, Serialize};

fn default_spec_type() -> Discriminator {
    Discriminator::versioned(super::GENERIC_CONFIG_TYPE, "v1")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigCollectionSpec {
    #[serde(rename = "type", default = "default_spec_type")]
    spec_type: Discriminator,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub configurations: Vec<UnstructuredObject>,
}

impl ConfigCollectionSpec {
    pub fn new() -> Self {
        ConfigCollectionSpec {
            spec_type: Discriminator::versioned(super::GENERIC_CONFIG_TYPE, "v1"),
            configurations: Vec::new(),
        }
    }

    /// Appends a member in its unstructured form.
    pub fn push(&mut self, spec: &dyn ConfigSpec) -> Result<(), DecodeError> {
        self.configurations.push(spec.to_unstructured()?);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.configurations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configurations.is_empty()
    }
}

impl Default for ConfigCollectionSpec {
    fn default() -> Self {
        ConfigCollectionSpec::new()
    }
}

impl TypedObject for ConfigCollectionSpec {
    fn discriminator(&self) -> Discriminator {
        self.spec_type.clone()
    }

    fn to_unstructured(&self) -> Result<UnstructuredObject, DecodeError> {
        UnstructuredObject::from_typed(self)
    }
}

impl ConfigSpec for ConfigCollectionSpec {
    fn apply_to(&self, ctx: &mut ConfigContext) -> Result<(), ConfigError> {
        let types = ctx.types_arc();
        for member in &self.configurations {
            let spec = types.convert_unstructured(member)?;
            ctx.apply(spec.as_ref())?;
        }
        Ok(())
    }
}
