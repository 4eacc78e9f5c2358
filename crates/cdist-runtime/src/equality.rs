//! Canonical equality.
//!
//! Two typed objects compare equal based on their serialized semantic
//! content, not field-by-field identity: both are re-marshaled to their
//! unstructured form and the RFC 8785 canonical JSON bytes are compared
//! exactly. Objects that fail to canonicalize are unequal, never equal
//! by fallback.

use crate::error::DecodeError;
use crate::typed::TypedObject;
use crate::unstructured::UnstructuredObject;

/// The canonical (JCS) byte form of an unstructured payload.
pub fn canonical_bytes(payload: &UnstructuredObject) -> Result<Vec<u8>, DecodeError> {
    serde_json_canonicalizer::to_vec(&payload.to_value())
        .map_err(|e| DecodeError::Canonicalize(e.to_string()))
}

/// Compares two unstructured payloads by discriminator and canonical
/// bytes.
pub fn unstructured_equal(a: &UnstructuredObject, b: &UnstructuredObject) -> bool {
    if a.discriminator() != b.discriminator() {
        return false;
    }
    match (canonical_bytes(a), canonical_bytes(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Compares two typed objects by their canonical marshaled form.
pub fn typed_objects_equal<A, B>(a: &A, b: &B) -> bool
where
    A: TypedObject + ?Sized,
    B: TypedObject + ?Sized,
{
    if a.discriminator() != b.discriminator() {
        return false;
    }
    match (a.to_unstructured(), b.to_unstructured()) {
        (Ok(a), Ok(b)) => unstructured_equal(&a, &b),
        _ => false,
    }
}
