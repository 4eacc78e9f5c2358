//! S3 object access.

use super::{AccessContext, AccessError, AccessHandle, AccessSpec};
use cdist_runtime::{DecodeError, Discriminator, TypedObject, UnstructuredObject};
use serde::{Deserialize, Serialize};

fn default_spec_type() -> Discriminator {
    Discriminator::versioned(super::S3_TYPE, "v1")
}

/// Access to an artifact stored as an object in an S3-compatible store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3AccessSpec {
    #[serde(rename = "type", default = "default_spec_type")]
    spec_type: Discriminator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    pub bucket: String,
    pub key: String,
    /// Object version for versioned buckets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
}

impl S3AccessSpec {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        S3AccessSpec {
            spec_type: Discriminator::versioned(super::S3_TYPE, "v1"),
            region: None,
            bucket: bucket.into(),
            key: key.into(),
            version: None,
            media_type: None,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

impl TypedObject for S3AccessSpec {
    fn discriminator(&self) -> Discriminator {
        self.spec_type.clone()
    }

    fn to_unstructured(&self) -> Result<UnstructuredObject, DecodeError> {
        UnstructuredObject::from_typed(self)
    }
}

impl AccessSpec for S3AccessSpec {
    fn describe(&self) -> String {
        format!("S3 object {}/{}", self.bucket, self.key)
    }

    fn resolve(&self, _ctx: &AccessContext) -> Result<AccessHandle, AccessError> {
        if self.bucket.is_empty() || self.key.is_empty() {
            return Err(AccessError::IncompleteSpec {
                spec_type: self.spec_type.clone(),
                reason: "bucket and key are required".into(),
            });
        }
        let mut locator = format!("s3://{}/{}", self.bucket, self.key);
        if let Some(version) = &self.version {
            locator.push('@');
            locator.push_str(version);
        }
        Ok(AccessHandle {
            locator,
            media_type: self.media_type.clone(),
        })
    }
}
