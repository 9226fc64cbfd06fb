//! Error types for receipt decoding.

use iap_receipt_der::{CoerceError, DecodeError, SourceError};
use thiserror::Error;

/// Errors that can occur while decoding a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// Reading the underlying bytes failed.
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    /// The DER structure is broken.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// A required value has the wrong type or encoding.
    #[error("coercion error: {0}")]
    Coerce(#[from] CoerceError),

    /// A required receipt attribute is absent.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// The stored receipt hash is not a SHA-1 digest.
    #[error("receipt hash must be 20 bytes, got {0}")]
    InvalidHashLength(usize),

    /// Product identifiers must be non-empty and free of control characters.
    #[error("invalid product identifier: {0:?}")]
    InvalidProductId(String),

    /// A device identifier string is not a UUID.
    #[error("invalid device identifier: {0}")]
    InvalidDeviceIdentifier(#[from] uuid::Error),

    /// The blob is neither a PKCS#7 container nor a bare attribute set.
    #[error("malformed receipt: {0}")]
    MalformedReceipt(String),

    /// The PKCS#7 container carries no embedded content.
    #[error("receipt container has no payload")]
    MissingPayload,
}

impl ReceiptError {
    /// True for value-level failures that leave the surrounding structure intact.
    ///
    /// Optional fields absorb these; source and structural errors never qualify.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Coerce(CoerceError::Source(_)) => false,
            Self::Coerce(_) | Self::InvalidProductId(_) => true,
            _ => false,
        }
    }
}

/// Result type for receipt operations.
pub type Result<T> = std::result::Result<T, ReceiptError>;
