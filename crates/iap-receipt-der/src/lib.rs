//! # IAP Receipt DER
//!
//! Read-only DER primitives for app-store receipts.
//!
//! This crate knows nothing about receipts. It turns bytes into
//! tag/length/value events and turns primitive values into Rust types.
//!
//! ## Key Types
//!
//! - [`ByteSource`] - Bounded random-access reader ([`MemorySource`], [`FileSource`])
//! - [`Decoder`] - Pull-style event iterator over a byte range
//! - [`Event`] - `Start(node)`, `Value(range)`, `End(node)` in document order
//! - [`Coercer`] - Typed access to primitive values (strings, integers, dates)
//!
//! ## Usage
//!
//! ```rust
//! use iap_receipt_der::{Coercer, Decoder, MemorySource, Tag};
//!
//! // INTEGER 42
//! let source = MemorySource::new(vec![0x02, 0x01, 0x2a]);
//! let mut decoder = Decoder::new(&source);
//! let node = decoder.expect_child(Tag::INTEGER).unwrap();
//! assert_eq!(Coercer::new(&source).integer(&node).unwrap(), 42);
//! ```
//!
//! Only definite-length encodings are accepted. Nothing here encodes DER.

pub mod coerce;
pub mod decoder;
pub mod error;
pub mod source;
pub mod tag;

pub use coerce::{decode_date, decode_integer, decode_string, Coercer};
pub use decoder::{decode_all, decode_header, Decoder, DecoderLimits, Event, DEFAULT_MAX_DEPTH};
pub use error::{CoerceError, DecodeError, SourceError};
pub use source::{ByteSource, FileSource, MemorySource};
pub use tag::{ByteRange, Node, Tag, TagClass};
