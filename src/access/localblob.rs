//! Access to blobs stored inside the component archive.

use super::{AccessContext, AccessError, AccessHandle, AccessSpec, GenericAccessSpec};
use cdist_runtime::{DecodeError, Discriminator, TypedObject, UnstructuredObject};
use serde::{Deserialize, Serialize};

fn default_spec_type() -> Discriminator {
    Discriminator::versioned(super::LOCAL_BLOB_TYPE, "v1")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalBlobAccessSpec {
    #[serde(rename = "type", default = "default_spec_type")]
    spec_type: Discriminator,
    /// Archive-relative blob identity (typically a digest).
    pub local_reference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    /// Name to use when the blob is re-imported into a registry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_name: Option<String>,
    /// Equivalent externally reachable access, when one exists. Kept
    /// generic: the global method may be of a type only a plugin knows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_access: Option<GenericAccessSpec>,
}

impl LocalBlobAccessSpec {
    pub fn new(local_reference: impl Into<String>) -> Self {
        LocalBlobAccessSpec {
            spec_type: Discriminator::versioned(super::LOCAL_BLOB_TYPE, "v1"),
            local_reference: local_reference.into(),
            media_type: None,
            reference_name: None,
            global_access: None,
        }
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    pub fn with_global_access(mut self, access: GenericAccessSpec) -> Self {
        self.global_access = Some(access);
        self
    }
}

impl TypedObject for LocalBlobAccessSpec {
    fn discriminator(&self) -> Discriminator {
        self.spec_type.clone()
    }

    fn to_unstructured(&self) -> Result<UnstructuredObject, DecodeError> {
        UnstructuredObject::from_typed(self)
    }
}

impl AccessSpec for LocalBlobAccessSpec {
    fn describe(&self) -> String {
        format!("local blob {}", self.local_reference)
    }

    fn is_local(&self) -> bool {
        true
    }

    fn resolve(&self, _ctx: &AccessContext) -> Result<AccessHandle, AccessError> {
        if self.local_reference.is_empty() {
            return Err(AccessError::IncompleteSpec {
                spec_type: self.spec_type.clone(),
                reason: "empty local reference".into(),
            });
        }
        Ok(AccessHandle {
            locator: self.local_reference.clone(),
            media_type: self.media_type.clone(),
        })
    }
}
