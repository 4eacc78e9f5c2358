//! Credentials config spec: maps consumer identities to credential
//! properties.

use super::{ConfigContext, ConfigError, ConfigSpec};
use cdist_runtime::{DecodeError, Discriminator, TypedObject, UnstructuredObject};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One consumer rule: the identity attributes a consumer presents
/// (`type`, `hostname`, `port`, ...) and the credential properties it
/// receives (`username`, `password`, `accessKeyID`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerRule {
    pub identity: BTreeMap<String, String>,
    pub credentials: BTreeMap<String, String>,
}

impl ConsumerRule {
    pub fn new() -> Self {
        ConsumerRule::default()
    }

    pub fn identity(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.identity.insert(key.into(), value.into());
        self
    }

    pub fn credential(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.credentials.insert(key.into(), value.into());
        self
    }
}

fn default_spec_type() -> Discriminator {
    Discriminator::versioned(super::CREDENTIALS_CONFIG_TYPE, "v1")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsConfigSpec {
    #[serde(rename = "type", default = "default_spec_type")]
    spec_type: Discriminator,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub consumers: Vec<ConsumerRule>,
}

impl CredentialsConfigSpec {
    pub fn new() -> Self {
        CredentialsConfigSpec {
            spec_type: Discriminator::versioned(super::CREDENTIALS_CONFIG_TYPE, "v1"),
            consumers: Vec::new(),
        }
    }

    pub fn with_consumer(mut self, rule: ConsumerRule) -> Self {
        self.consumers.push(rule);
        self
    }
}

impl Default for CredentialsConfigSpec {
    fn default() -> Self {
        CredentialsConfigSpec::new()
    }
}

impl TypedObject for CredentialsConfigSpec {
    fn discriminator(&self) -> Discriminator {
        self.spec_type.clone()
    }

    fn to_unstructured(&self) -> Result<UnstructuredObject, DecodeError> {
        UnstructuredObject::from_typed(self)
    }
}

impl ConfigSpec for CredentialsConfigSpec {
    fn apply_to(&self, ctx: &mut ConfigContext) -> Result<(), ConfigError> {
        for rule in &self.consumers {
            ctx.add_consumer(rule.clone());
        }
        Ok(())
    }
}
