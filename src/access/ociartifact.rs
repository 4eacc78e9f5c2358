//! Access to artifacts stored in an OCI registry.

use super::{AccessContext, AccessError, AccessHandle, AccessSpec};
use cdist_runtime::{DecodeError, Discriminator, TypedObject, UnstructuredObject};
use serde::{Deserialize, Serialize};

fn default_spec_type() -> Discriminator {
    Discriminator::versioned(super::OCI_ARTIFACT_TYPE, "v1")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OciArtifactAccessSpec {
    #[serde(rename = "type", default = "default_spec_type")]
    spec_type: Discriminator,
    /// Full image reference including tag or digest.
    pub image_reference: String,
}

impl OciArtifactAccessSpec {
    pub fn new(image_reference: impl Into<String>) -> Self {
        OciArtifactAccessSpec {
            spec_type: Discriminator::versioned(super::OCI_ARTIFACT_TYPE, "v1"),
            image_reference: image_reference.into(),
        }
    }
}

impl TypedObject for OciArtifactAccessSpec {
    fn discriminator(&self) -> Discriminator {
        self.spec_type.clone()
    }

    fn to_unstructured(&self) -> Result<UnstructuredObject, DecodeError> {
        UnstructuredObject::from_typed(self)
    }
}

impl AccessSpec for OciArtifactAccessSpec {
    fn describe(&self) -> String {
        format!("OCI artifact {}", self.image_reference)
    }

    fn resolve(&self, _ctx: &AccessContext) -> Result<AccessHandle, AccessError> {
        if self.image_reference.is_empty() {
            return Err(AccessError::IncompleteSpec {
                spec_type: self.spec_type.clone(),
                reason: "empty image reference".into(),
            });
        }
        Ok(AccessHandle {
            locator: self.image_reference.clone(),
            media_type: None,
        })
    }
}
