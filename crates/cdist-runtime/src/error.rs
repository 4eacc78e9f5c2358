//! Decode error taxonomy for the typed-object runtime.
//!
//! Every failure is returned to the immediate caller; the runtime never
//! retries and never logs. `UnknownType` is the one deferred error: it is
//! raised when a semantic operation is invoked on a spec whose type had no
//! registered decoder, never at parse time.

use crate::discriminator::Discriminator;
use thiserror::Error;

/// Errors produced by discriminator parsing, scheme decoding and
/// canonical re-marshaling.
#[derive(Debug, Clone, Error)]
pub enum DecodeError {
    /// The payload carries neither a `type` field nor a `kind` field.
    #[error("payload carries no type discriminator")]
    MissingDiscriminator,

    /// The codec failed to unmarshal the payload, or the payload is not
    /// an object with the expected field shapes.
    #[error("malformed {codec} payload: {detail}")]
    MalformedPayload { codec: &'static str, detail: String },

    /// Strict-mode decode found no registered decoder for the type.
    #[error("no decoder registered for type {0}")]
    UnregisteredType(Discriminator),

    /// A semantic operation was invoked on a spec whose type is unknown
    /// to the resolving scheme.
    #[error("unknown type {0}")]
    UnknownType(Discriminator),

    /// The canonical re-marshal of an object failed.
    #[error("unable to canonicalize object: {0}")]
    Canonicalize(String),
}

impl DecodeError {
    /// Builds a `MalformedPayload` for the named codec.
    pub fn malformed(codec: &'static str, detail: impl Into<String>) -> Self {
        DecodeError::MalformedPayload {
            codec,
            detail: detail.into(),
        }
    }
}
