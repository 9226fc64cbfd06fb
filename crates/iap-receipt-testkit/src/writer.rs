//! Minimal DER writer for building fixtures.
//!
//! Only what receipts need: definite lengths, minimal integers, and the
//! handful of universal types that appear in a receipt.

use iap_receipt_der::{Tag, TagClass};

/// Encode an identifier, using the long form for numbers >= 31.
pub fn encode_tag(tag: Tag) -> Vec<u8> {
    let class_bits: u8 = match tag.class {
        TagClass::Universal => 0x00,
        TagClass::Application => 0x40,
        TagClass::ContextSpecific => 0x80,
        TagClass::Private => 0xc0,
    };
    let form = if tag.constructed { 0x20 } else { 0x00 };

    if tag.number < 0x1f {
        return vec![class_bits | form | tag.number as u8];
    }

    let mut digits = Vec::new();
    let mut n = tag.number;
    loop {
        digits.push((n & 0x7f) as u8);
        n >>= 7;
        if n == 0 {
            break;
        }
    }
    let mut out = vec![class_bits | form | 0x1f];
    let last = digits.len() - 1;
    for (i, digit) in digits.iter().rev().enumerate() {
        out.push(if i == last { *digit } else { digit | 0x80 });
    }
    out
}

/// Encode a definite length in its shortest form.
pub fn encode_length(len: usize) -> Vec<u8> {
    if len < 0x80 {
        return vec![len as u8];
    }
    let bytes = (len as u64).to_be_bytes();
    let skip = bytes.iter().take_while(|b| **b == 0).count();
    let mut out = vec![0x80 | (8 - skip) as u8];
    out.extend_from_slice(&bytes[skip..]);
    out
}

pub fn tlv(tag: Tag, content: &[u8]) -> Vec<u8> {
    let mut out = encode_tag(tag);
    out.extend(encode_length(content.len()));
    out.extend_from_slice(content);
    out
}

/// Minimal two's-complement INTEGER.
pub fn integer(value: i64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let mut start = 0;
    while start < 7 {
        let redundant = (bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0)
            || (bytes[start] == 0xff && bytes[start + 1] & 0x80 != 0);
        if !redundant {
            break;
        }
        start += 1;
    }
    tlv(Tag::INTEGER, &bytes[start..])
}

pub fn utf8_string(value: &str) -> Vec<u8> {
    tlv(Tag::UTF8_STRING, value.as_bytes())
}

pub fn ia5_string(value: &str) -> Vec<u8> {
    tlv(Tag::IA5_STRING, value.as_bytes())
}

pub fn octet_string(value: &[u8]) -> Vec<u8> {
    tlv(Tag::OCTET_STRING, value)
}

/// OBJECT IDENTIFIER from its already-encoded content octets.
pub fn oid(content: &[u8]) -> Vec<u8> {
    tlv(Tag::OBJECT_IDENTIFIER, content)
}

pub fn null() -> Vec<u8> {
    tlv(Tag::NULL, &[])
}

pub fn sequence(children: &[Vec<u8>]) -> Vec<u8> {
    tlv(Tag::SEQUENCE, &children.concat())
}

pub fn set(children: &[Vec<u8>]) -> Vec<u8> {
    tlv(Tag::SET, &children.concat())
}

/// `[n] EXPLICIT` wrapper.
pub fn explicit(number: u32, inner: &[u8]) -> Vec<u8> {
    tlv(Tag::context(number, true), inner)
}

/// `SEQUENCE { INTEGER type, INTEGER version, OCTET STRING value }`.
pub fn attribute(type_code: i64, version: i64, value: &[u8]) -> Vec<u8> {
    sequence(&[integer(type_code), integer(version), octet_string(value)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use iap_receipt_der::{decode_header, decode_integer, ByteSource, MemorySource};

    #[test]
    fn test_short_and_long_lengths() {
        assert_eq!(encode_length(0), vec![0x00]);
        assert_eq!(encode_length(0x7f), vec![0x7f]);
        assert_eq!(encode_length(0x80), vec![0x81, 0x80]);
        assert_eq!(encode_length(0x1234), vec![0x82, 0x12, 0x34]);
    }

    #[test]
    fn test_minimal_integers() {
        assert_eq!(integer(0), vec![0x02, 0x01, 0x00]);
        assert_eq!(integer(127), vec![0x02, 0x01, 0x7f]);
        assert_eq!(integer(128), vec![0x02, 0x02, 0x00, 0x80]);
        assert_eq!(integer(1702), vec![0x02, 0x02, 0x06, 0xa6]);
        assert_eq!(integer(-1), vec![0x02, 0x01, 0xff]);
        assert_eq!(integer(-129), vec![0x02, 0x02, 0xff, 0x7f]);
    }

    #[test]
    fn test_integers_decode_to_same_value() {
        for value in [0, 1, -1, 255, 256, -256, 1701, i64::MAX, i64::MIN] {
            let bytes = integer(value);
            let decoded = decode_integer(Tag::INTEGER, &bytes[2..]).unwrap();
            assert_eq!(decoded, value);
        }
    }

    #[test]
    fn test_long_form_tag_is_readable() {
        let tag = Tag {
            class: TagClass::Application,
            constructed: false,
            number: 201,
        };
        let bytes = tlv(tag, &[0xff]);
        assert_eq!(&bytes[..3], &[0x5f, 0x81, 0x49]);

        let source = MemorySource::new(bytes);
        let node = decode_header(&source, 0, source.len()).unwrap();
        assert_eq!(node.tag, tag);
    }

    #[test]
    fn test_attribute_shape() {
        let bytes = attribute(3, 1, &utf8_string("a"));
        assert_eq!(
            bytes,
            vec![0x30, 0x0b, 0x02, 0x01, 0x03, 0x02, 0x01, 0x01, 0x04, 0x03, 0x0c, 0x01, b'a']
        );
    }
}
