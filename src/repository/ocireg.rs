//! OCI registry repository spec.

use super::{RepositoryContext, RepositoryError, RepositoryHandle, RepositorySpec};
use cdist_runtime::{DecodeError, Discriminator, TypedObject, UnstructuredObject};
use serde::{Deserialize, Serialize};

fn default_spec_type() -> Discriminator {
    Discriminator::versioned(super::OCI_REGISTRY_TYPE, "v1")
}

/// Describes a component repository hosted in an OCI registry.
///
/// `baseUrl` names the registry host (optionally with a port and a
/// leading scheme); `subPath` is the repository prefix all component
/// artifacts live under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OciRegistryRepositorySpec {
    // the split kind/version wire form carries no `type` field; the
    // scheme has already normalized the discriminator before decode
    #[serde(rename = "type", default = "default_spec_type")]
    spec_type: Discriminator,
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_path: Option<String>,
}

impl OciRegistryRepositorySpec {
    pub fn new(base_url: impl Into<String>) -> Self {
        OciRegistryRepositorySpec {
            spec_type: Discriminator::versioned(super::OCI_REGISTRY_TYPE, "v1"),
            base_url: base_url.into(),
            sub_path: None,
        }
    }

    pub fn with_sub_path(mut self, sub_path: impl Into<String>) -> Self {
        self.sub_path = Some(sub_path.into());
        self
    }

    /// Host plus sub path, scheme stripped.
    fn locator(&self) -> String {
        let host = self
            .base_url
            .strip_prefix("https://")
            .or_else(|| self.base_url.strip_prefix("http://"))
            .unwrap_or(&self.base_url);
        match &self.sub_path {
            Some(sub) => format!("{}/{}", host.trim_end_matches('/'), sub.trim_matches('/')),
            None => host.trim_end_matches('/').to_string(),
        }
    }
}

impl TypedObject for OciRegistryRepositorySpec {
    fn discriminator(&self) -> Discriminator {
        self.spec_type.clone()
    }

    fn to_unstructured(&self) -> Result<UnstructuredObject, DecodeError> {
        UnstructuredObject::from_typed(self)
    }
}

impl RepositorySpec for OciRegistryRepositorySpec {
    fn name(&self) -> String {
        self.locator()
    }

    fn open(&self, _ctx: &RepositoryContext) -> Result<RepositoryHandle, RepositoryError> {
        if self.base_url.is_empty() {
            return Err(RepositoryError::InvalidLocator {
                locator: self.base_url.clone(),
                reason: "empty base url".into(),
            });
        }
        Ok(RepositoryHandle {
            locator: self.locator(),
            spec_type: self.spec_type.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::default_repository_scheme;

    #[test]
    fn test_locator_strips_scheme_and_joins_sub_path() {
        let spec = OciRegistryRepositorySpec::new("https://ghcr.io/").with_sub_path("/acme/");
        assert_eq!(spec.name(), "ghcr.io/acme");
    }

    #[test]
    fn test_open_rejects_empty_base_url() {
        let ctx = RepositoryContext::new(default_repository_scheme());
        let spec = OciRegistryRepositorySpec::new("");
        assert!(matches!(
            spec.open(&ctx).unwrap_err(),
            RepositoryError::InvalidLocator { .. }
        ));
    }

    #[test]
    fn test_serialization_shape() {
        let spec = OciRegistryRepositorySpec::new("ghcr.io");
        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(value["type"], "ociRegistry/v1");
        assert_eq!(value["baseUrl"], "ghcr.io");
        assert!(value.get("subPath").is_none());
    }
}
