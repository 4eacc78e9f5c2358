//! Common transport format repository spec.
//!
//! A CTF repository is a file-system representation of component
//! artifacts, used to move them between registries without a live
//! connection on both ends.

use super::{RepositoryContext, RepositoryError, RepositoryHandle, RepositorySpec};
use cdist_runtime::{DecodeError, Discriminator, TypedObject, UnstructuredObject};
use serde::{Deserialize, Serialize};

/// On-disk layout of a transport archive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    #[default]
    Directory,
    Tar,
    Tgz,
}

fn default_spec_type() -> Discriminator {
    Discriminator::versioned(super::COMMON_TRANSPORT_TYPE, "v1")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonTransportRepositorySpec {
    #[serde(rename = "type", default = "default_spec_type")]
    spec_type: Discriminator,
    pub file_path: String,
    #[serde(default)]
    pub file_format: FileFormat,
    /// Create the archive on first write instead of failing.
    #[serde(default)]
    pub create_if_missing: bool,
}

impl CommonTransportRepositorySpec {
    pub fn new(file_path: impl Into<String>, file_format: FileFormat) -> Self {
        CommonTransportRepositorySpec {
            spec_type: Discriminator::versioned(super::COMMON_TRANSPORT_TYPE, "v1"),
            file_path: file_path.into(),
            file_format,
            create_if_missing: false,
        }
    }

    pub fn with_create_if_missing(mut self) -> Self {
        self.create_if_missing = true;
        self
    }
}

impl TypedObject for CommonTransportRepositorySpec {
    fn discriminator(&self) -> Discriminator {
        self.spec_type.clone()
    }

    fn to_unstructured(&self) -> Result<UnstructuredObject, DecodeError> {
        UnstructuredObject::from_typed(self)
    }
}

impl RepositorySpec for CommonTransportRepositorySpec {
    fn name(&self) -> String {
        self.file_path.clone()
    }

    fn open(&self, _ctx: &RepositoryContext) -> Result<RepositoryHandle, RepositoryError> {
        if self.file_path.is_empty() {
            return Err(RepositoryError::InvalidLocator {
                locator: self.file_path.clone(),
                reason: "empty file path".into(),
            });
        }
        Ok(RepositoryHandle {
            locator: self.file_path.clone(),
            spec_type: self.spec_type.clone(),
        })
    }
}
