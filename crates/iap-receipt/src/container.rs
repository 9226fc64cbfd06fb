//! PKCS#7 envelope.
//!
//! Receipts ship as `ContentInfo { signedData, [0] SignedData }` with the
//! attribute SET as the encapsulated content. Only the DER structure is
//! walked here; signatures and certificates are not examined.

use iap_receipt_der::{ByteRange, ByteSource, Coercer, DecodeError, Decoder, DecoderLimits, Tag};
use tracing::trace;

use crate::error::{ReceiptError, Result};

/// `1.2.840.113549.1.7.2`
pub const SIGNED_DATA_OID: &[u8] = &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x07, 0x02];

/// `1.2.840.113549.1.7.1`
pub const DATA_OID: &[u8] = &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x07, 0x01];

const EXPLICIT_0: Tag = Tag::context(0, true);

/// Find the attribute SET inside a receipt blob.
///
/// A blob that already starts with a SET is its own payload and the whole
/// element is returned. Otherwise the blob must be a PKCS#7 `SignedData`
/// and the range of its embedded OCTET STRING content is returned.
pub fn locate_payload<S: ByteSource + ?Sized>(
    source: &S,
    limits: DecoderLimits,
) -> Result<ByteRange> {
    let mut decoder = Decoder::new(source).limits(limits);
    let coercer = Coercer::new(source);

    let Some(outer) = decoder.next_child()? else {
        return Err(ReceiptError::MalformedReceipt("empty receipt".into()));
    };
    match outer.tag {
        Tag::SET => {
            trace!(length = outer.content.length, "bare attribute set");
            return Ok(outer.full_range());
        }
        Tag::SEQUENCE => {}
        other => {
            return Err(ReceiptError::MalformedReceipt(format!(
                "expected PKCS#7 ContentInfo or attribute SET, found {}",
                other
            )))
        }
    }

    let content_type = decoder.expect_child(Tag::OBJECT_IDENTIFIER)?;
    if coercer.octets(&content_type)?.as_ref() != SIGNED_DATA_OID {
        return Err(ReceiptError::MalformedReceipt(
            "content type is not signedData".into(),
        ));
    }

    // SignedData { version, digestAlgorithms, encapContentInfo, ... }
    decoder.expect_child(EXPLICIT_0)?;
    decoder.expect_child(Tag::SEQUENCE)?;
    decoder.expect_child(Tag::INTEGER)?;
    decoder.expect_child(Tag::SET)?;
    decoder.skip_to_end()?;

    // EncapsulatedContentInfo { eContentType, [0] EXPLICIT eContent OPTIONAL }
    decoder.expect_child(Tag::SEQUENCE)?;
    let econtent_type = decoder.expect_child(Tag::OBJECT_IDENTIFIER)?;
    if coercer.octets(&econtent_type)?.as_ref() != DATA_OID {
        return Err(ReceiptError::MalformedReceipt(
            "encapsulated content type is not data".into(),
        ));
    }

    match decoder.next_child()? {
        None => Err(ReceiptError::MissingPayload),
        Some(node) if node.tag == EXPLICIT_0 => {
            let content = decoder.expect_child(Tag::OCTET_STRING)?;
            trace!(
                offset = content.content.offset,
                length = content.content.length,
                "located PKCS#7 payload"
            );
            Ok(content.content)
        }
        Some(node) => Err(DecodeError::UnexpectedNode {
            offset: node.header_offset,
            expected: EXPLICIT_0,
            found: node.tag,
        }
        .into()),
    }
}
