//! Type-directed coercion of primitive values.
//!
//! The `decode_*` functions are pure: `(tag, content bytes) -> value`.
//! [`Coercer`] checks the tag first and only then reads the node's content
//! range from the source, never anything outside it.

use bytes::Bytes;
use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::CoerceError;
use crate::source::ByteSource;
use crate::tag::{Node, Tag};

/// Fixed formats tried after RFC 3339 for text dates.
const TEXT_DATE_FALLBACKS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%SZ",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S Etc/GMT",
];

const UTC_TIME_FORMAT: &str = "%y%m%d%H%M%SZ";
const GENERALIZED_TIME_FORMATS: &[&str] = &["%Y%m%d%H%M%SZ", "%Y%m%d%H%M%S%.fZ"];

/// Decode a UTF8String, IA5String or PrintableString.
pub fn decode_string(tag: Tag, bytes: &[u8]) -> Result<String, CoerceError> {
    match tag {
        Tag::UTF8_STRING => {}
        Tag::IA5_STRING => {
            if !bytes.is_ascii() {
                return Err(CoerceError::EncodingError(
                    "IA5String contains non-ASCII bytes".into(),
                ));
            }
        }
        Tag::PRINTABLE_STRING => {
            if let Some(byte) = bytes.iter().find(|b| !is_printable(**b)) {
                return Err(CoerceError::EncodingError(format!(
                    "PrintableString contains invalid byte 0x{:02x}",
                    byte
                )));
            }
        }
        found => {
            return Err(CoerceError::TypeMismatch {
                expected: "string",
                found,
            })
        }
    }

    String::from_utf8(bytes.to_vec())
        .map_err(|e| CoerceError::EncodingError(format!("invalid UTF-8: {}", e)))
}

fn is_printable(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || b" '()+,-./:=?".contains(&byte)
}

/// Decode a big-endian two's-complement INTEGER into an `i64`.
///
/// Redundant sign-extension octets are accepted; anything wider than
/// 64 significant bits is `IntegerOverflow`.
pub fn decode_integer(tag: Tag, bytes: &[u8]) -> Result<i64, CoerceError> {
    if tag != Tag::INTEGER {
        return Err(CoerceError::TypeMismatch {
            expected: "INTEGER",
            found: tag,
        });
    }
    let Some(first) = bytes.first() else {
        return Err(CoerceError::EncodingError("empty INTEGER".into()));
    };

    let negative = first & 0x80 != 0;
    let fill = if negative { 0xff } else { 0x00 };
    let mut start = 0;
    while start + 1 < bytes.len()
        && bytes[start] == fill
        && (bytes[start + 1] & 0x80 != 0) == negative
    {
        start += 1;
    }

    let significant = &bytes[start..];
    if significant.len() > 8 {
        return Err(CoerceError::IntegerOverflow(significant.len()));
    }

    let init: i64 = if negative { -1 } else { 0 };
    Ok(significant
        .iter()
        .fold(init, |acc, byte| (acc << 8) | i64::from(*byte)))
}

/// Decode a timestamp.
///
/// Text tags are parsed as RFC 3339 first, then as the fixed fallback
/// formats. UTCTime and GeneralizedTime use their ASN.1 forms.
pub fn decode_date(tag: Tag, bytes: &[u8]) -> Result<DateTime<Utc>, CoerceError> {
    match tag {
        Tag::UTC_TIME => {
            let text = ascii_text(bytes)?;
            parse_fixed(text, &[UTC_TIME_FORMAT])
        }
        Tag::GENERALIZED_TIME => {
            let text = ascii_text(bytes)?;
            parse_fixed(text, GENERALIZED_TIME_FORMATS)
        }
        tag if tag.is_string() => {
            let text = decode_string(tag, bytes)?;
            let text = text.trim();
            if text.is_empty() {
                return Err(CoerceError::FormatError("empty date".into()));
            }
            match DateTime::parse_from_rfc3339(text) {
                Ok(dt) => Ok(dt.with_timezone(&Utc)),
                Err(_) => parse_fixed(text, TEXT_DATE_FALLBACKS),
            }
        }
        found => Err(CoerceError::TypeMismatch {
            expected: "date string",
            found,
        }),
    }
}

fn ascii_text(bytes: &[u8]) -> Result<&str, CoerceError> {
    if !bytes.is_ascii() {
        return Err(CoerceError::EncodingError("time value is not ASCII".into()));
    }
    std::str::from_utf8(bytes).map_err(|e| CoerceError::EncodingError(e.to_string()))
}

fn parse_fixed(text: &str, formats: &[&str]) -> Result<DateTime<Utc>, CoerceError> {
    formats
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| CoerceError::FormatError(format!("unrecognized date: {:?}", text)))
}

/// Typed access to the primitive nodes of one source.
pub struct Coercer<'s, S: ByteSource + ?Sized> {
    source: &'s S,
}

impl<'s, S: ByteSource + ?Sized> Coercer<'s, S> {
    pub fn new(source: &'s S) -> Self {
        Self { source }
    }

    /// Raw content octets of any node.
    pub fn octets(&self, node: &Node) -> Result<Bytes, CoerceError> {
        Ok(self.source.read(node.content)?)
    }

    pub fn string(&self, node: &Node) -> Result<String, CoerceError> {
        if !node.tag.is_string() {
            return Err(CoerceError::TypeMismatch {
                expected: "string",
                found: node.tag,
            });
        }
        decode_string(node.tag, &self.octets(node)?)
    }

    pub fn integer(&self, node: &Node) -> Result<i64, CoerceError> {
        if node.tag != Tag::INTEGER {
            return Err(CoerceError::TypeMismatch {
                expected: "INTEGER",
                found: node.tag,
            });
        }
        decode_integer(node.tag, &self.octets(node)?)
    }

    pub fn date(&self, node: &Node) -> Result<DateTime<Utc>, CoerceError> {
        let is_time = matches!(node.tag, Tag::UTC_TIME | Tag::GENERALIZED_TIME);
        if !is_time && !node.tag.is_string() {
            return Err(CoerceError::TypeMismatch {
                expected: "date string",
                found: node.tag,
            });
        }
        decode_date(node.tag, &self.octets(node)?)
    }

    /// INTEGER or BOOLEAN read as a flag; any non-zero value is `true`.
    pub fn flag(&self, node: &Node) -> Result<bool, CoerceError> {
        match node.tag {
            Tag::BOOLEAN => {
                let bytes = self.octets(node)?;
                match bytes.as_ref() {
                    [value] => Ok(*value != 0),
                    _ => Err(CoerceError::EncodingError(
                        "BOOLEAN must be a single octet".into(),
                    )),
                }
            }
            _ => self.integer(node).map(|value| value != 0),
        }
    }
}
