//! The contract every registered family member satisfies.

use crate::discriminator::Discriminator;
use crate::error::DecodeError;
use crate::unstructured::UnstructuredObject;

/// A typed object: serializable through its family's codec and able to
/// name its own discriminator.
///
/// Family traits (repository specs, access specs, config specs) extend
/// this with their semantic operations; the runtime itself only ever
/// needs these two capabilities.
pub trait TypedObject: Send + Sync {
    fn discriminator(&self) -> Discriminator;

    /// The canonical unstructured form of this object, obtained by a
    /// marshal round trip. Concrete implementations are one line:
    /// `UnstructuredObject::from_typed(self)`.
    fn to_unstructured(&self) -> Result<UnstructuredObject, DecodeError>;
}

impl TypedObject for UnstructuredObject {
    fn discriminator(&self) -> Discriminator {
        UnstructuredObject::discriminator(self).clone()
    }

    fn to_unstructured(&self) -> Result<UnstructuredObject, DecodeError> {
        Ok(self.clone())
    }
}
