use std::fmt;
use thiserror::Error;

use crate::field::FieldId;

/// What a failed validator was looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationTarget {
    /// A single field, identified by its tag.
    Field(FieldId),
    /// The message-level cross-field validator.
    Message,
}

impl fmt::Display for ValidationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationTarget::Field(id) => write!(f, "field {id}"),
            ValidationTarget::Message => f.write_str("message"),
        }
    }
}

/// Custom error types for the fixedwire library.
///
/// Every variant is `Copy` and carries only fixed-size data so that returning an
/// error never touches the heap.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A named validator rejected a staged value, or the message-level rules failed.
    #[error("Validation failed on {target}: {validator}: {reason}")]
    ValidationFailed {
        target: ValidationTarget,
        validator: &'static str,
        reason: &'static str,
    },

    /// An array, map or string write would exceed the declared bound.
    #[error("Capacity exceeded on field {field}: maximum is {capacity}")]
    CapacityExceeded { field: FieldId, capacity: usize },

    /// The encoded frame does not fit the destination storage.
    #[error("Buffer overflow: {required} bytes required, capacity is {capacity}")]
    BufferOverflow { required: usize, capacity: usize },

    /// Malformed tag/length, truncated static layout or otherwise undecodable bytes.
    #[error("Invalid frame: {reason}")]
    InvalidFrame { reason: &'static str },

    /// Checksum mismatch error when calculated checksum doesn't match stored checksum.
    #[error("Checksum mismatch: expected {expected}, got {calculated}")]
    ChecksumMismatch { expected: u64, calculated: u64 },

    /// No decoder is registered for the envelope's protocol discriminator.
    #[error("Unknown protocol discriminator: {discriminator:#04x}")]
    UnknownProtocol { discriminator: u8 },
}

impl Error {
    /// Create a new `InvalidFrame` error with a descriptive reason.
    pub fn invalid_frame(reason: &'static str) -> Self {
        Self::InvalidFrame { reason }
    }

    /// Create a new `ChecksumMismatch` error with expected and calculated values.
    pub fn checksum_mismatch(expected: u64, calculated: u64) -> Self {
        Self::ChecksumMismatch {
            expected,
            calculated,
        }
    }

    pub fn overflow(required: usize, capacity: usize) -> Self {
        Self::BufferOverflow { required, capacity }
    }

    pub fn capacity_exceeded(field: FieldId, capacity: usize) -> Self {
        Self::CapacityExceeded { field, capacity }
    }

    /// Name of the validator behind a `ValidationFailed` error.
    pub fn validator(&self) -> Option<&'static str> {
        match self {
            Self::ValidationFailed { validator, .. } => Some(*validator),
            _ => None,
        }
    }

    /// True for errors that mean "corrupted on the wire".
    pub fn is_integrity(&self) -> bool {
        matches!(self, Self::ChecksumMismatch { .. })
    }

    /// True for errors that mean "malformed payload".
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            Self::InvalidFrame { .. } | Self::UnknownProtocol { .. }
        )
    }

    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ValidationFailed { .. } | Self::CapacityExceeded { .. }
        )
    }
}

/// Result type alias for the library operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
