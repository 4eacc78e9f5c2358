//! Attributes config spec: free-form context attributes.

use super::{ConfigContext, ConfigError, ConfigSpec};
use cdist_runtime::{DecodeError, Discriminator, TypedObject, UnstructuredObject};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

fn default_spec_type() -> Discriminator {
    Discriminator::versioned(super::ATTRIBUTES_CONFIG_TYPE, "v1")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributesConfigSpec {
    #[serde(rename = "type", default = "default_spec_type")]
    spec_type: Discriminator,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
}

impl AttributesConfigSpec {
    pub fn new() -> Self {
        AttributesConfigSpec {
            spec_type: Discriminator::versioned(super::ATTRIBUTES_CONFIG_TYPE, "v1"),
            attributes: Map::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }
}

impl Default for AttributesConfigSpec {
    fn default() -> Self {
        AttributesConfigSpec::new()
    }
}

impl TypedObject for AttributesConfigSpec {
    fn discriminator(&self) -> Discriminator {
        self.spec_type.clone()
    }

    fn to_unstructured(&self) -> Result<UnstructuredObject, DecodeError> {
        UnstructuredObject::from_typed(self)
    }
}

impl ConfigSpec for AttributesConfigSpec {
    fn apply_to(&self, ctx: &mut ConfigContext) -> Result<(), ConfigError> {
        for (name, value) in &self.attributes {
            ctx.set_attribute(name.clone(), value.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_config_scheme;
    use serde_json::json;

    #[test]
    fn test_apply_sets_attributes_last_wins() {
        let mut ctx = ConfigContext::new(default_config_scheme());
        ctx.apply(&AttributesConfigSpec::new().with_attribute("cache.dir", json!("/var/a")))
            .unwrap();
        ctx.apply(&AttributesConfigSpec::new().with_attribute("cache.dir", json!("/var/b")))
            .unwrap();
        assert_eq!(ctx.attribute("cache.dir"), Some(&json!("/var/b")));
    }
}
