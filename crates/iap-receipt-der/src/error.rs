//! Error types for DER decoding.

use thiserror::Error;

use crate::tag::Tag;

/// Errors raised by a [`ByteSource`](crate::ByteSource).
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("read of {length} bytes at offset {offset} exceeds source size {size}")]
    OutOfBounds { offset: u64, length: u64, size: u64 },

    #[error("source of {size} bytes exceeds the limit of {limit} bytes")]
    TooLarge { size: u64, limit: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Structural errors. Any of these aborts the whole decode.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("truncated data at offset {offset}: need {needed} bytes, {available} available")]
    TruncatedData {
        offset: u64,
        needed: u64,
        available: u64,
    },

    #[error("malformed length at offset {offset}: {reason}")]
    MalformedLength { offset: u64, reason: &'static str },

    #[error("malformed tag at offset {offset}: tag number overflows 32 bits")]
    MalformedTag { offset: u64 },

    #[error("nesting deeper than {max} levels at offset {offset}")]
    DepthExceeded { offset: u64, max: usize },

    #[error("unexpected node at offset {offset}: expected {expected}, found {found}")]
    UnexpectedNode {
        offset: u64,
        expected: Tag,
        found: Tag,
    },

    #[error("unexpected end of content: expected {expected}")]
    UnexpectedEnd { expected: Tag },

    #[error("source error: {0}")]
    Source(#[from] SourceError),
}

/// Errors converting a primitive value into a typed value.
#[derive(Debug, Error)]
pub enum CoerceError {
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: &'static str, found: Tag },

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("format error: {0}")]
    FormatError(String),

    #[error("integer does not fit in 64 bits ({0} significant bytes)")]
    IntegerOverflow(usize),

    #[error("source error: {0}")]
    Source(#[from] SourceError),
}
