//! Attribute sets.
//!
//! Both the receipt payload and every in-app purchase are
//! `SET OF SEQUENCE { INTEGER type, INTEGER version, OCTET STRING value }`.
//! [`AttributeReader`] pulls those triples out of the event stream; the
//! value of each is itself a single DER element that the typed accessors
//! decode on demand.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use iap_receipt_der::{
    decode_header, ByteRange, ByteSource, CoerceError, Coercer, DecodeError, Decoder,
    DecoderLimits, Node, Tag,
};
use tracing::debug;

use crate::error::{ReceiptError, Result};

/// Receipt-level attribute types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i64)]
pub enum ReceiptField {
    BundleIdentifier = 3,
    OpaqueValue = 4,
    ReceiptHash = 5,
    CreationDate = 12,
    /// Nested attribute set for one purchase.
    InAppPurchase = 17,
    OriginalApplicationVersion = 19,
    ExpirationDate = 21,
}

impl ReceiptField {
    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            3 => Some(Self::BundleIdentifier),
            4 => Some(Self::OpaqueValue),
            5 => Some(Self::ReceiptHash),
            12 => Some(Self::CreationDate),
            17 => Some(Self::InAppPurchase),
            19 => Some(Self::OriginalApplicationVersion),
            21 => Some(Self::ExpirationDate),
            _ => None,
        }
    }

    /// Field name used in errors and logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::BundleIdentifier => "bundle_identifier",
            Self::OpaqueValue => "opaque_value",
            Self::ReceiptHash => "receipt_hash",
            Self::CreationDate => "creation_date",
            Self::InAppPurchase => "in_app_purchase",
            Self::OriginalApplicationVersion => "original_application_version",
            Self::ExpirationDate => "expiration_date",
        }
    }
}

/// Purchase-level attribute types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i64)]
pub enum PurchaseField {
    Quantity = 1701,
    ProductIdentifier = 1702,
    TransactionIdentifier = 1703,
    PurchaseDate = 1704,
    OriginalTransactionIdentifier = 1705,
    OriginalPurchaseDate = 1706,
    SubscriptionExpirationDate = 1708,
    WebOrderLineItemId = 1711,
    CancellationDate = 1712,
    IsTrialPeriod = 1713,
    IsInIntroOfferPeriod = 1719,
}

impl PurchaseField {
    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1701 => Some(Self::Quantity),
            1702 => Some(Self::ProductIdentifier),
            1703 => Some(Self::TransactionIdentifier),
            1704 => Some(Self::PurchaseDate),
            1705 => Some(Self::OriginalTransactionIdentifier),
            1706 => Some(Self::OriginalPurchaseDate),
            1708 => Some(Self::SubscriptionExpirationDate),
            1711 => Some(Self::WebOrderLineItemId),
            1712 => Some(Self::CancellationDate),
            1713 => Some(Self::IsTrialPeriod),
            1719 => Some(Self::IsInIntroOfferPeriod),
            _ => None,
        }
    }

    /// Field name used in errors and logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::Quantity => "quantity",
            Self::ProductIdentifier => "product_identifier",
            Self::TransactionIdentifier => "transaction_id",
            Self::PurchaseDate => "purchase_date",
            Self::OriginalTransactionIdentifier => "original_transaction_id",
            Self::OriginalPurchaseDate => "original_purchase_date",
            Self::SubscriptionExpirationDate => "subscription_expiration_date",
            Self::WebOrderLineItemId => "web_order_line_item_id",
            Self::CancellationDate => "cancellation_date",
            Self::IsTrialPeriod => "is_trial_period",
            Self::IsInIntroOfferPeriod => "is_in_intro_offer_period",
        }
    }
}

/// One `{type, version, value}` triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptAttribute {
    pub type_code: i64,
    pub version: i64,
    /// Content of the OCTET STRING.
    pub value: ByteRange,
}

impl ReceiptAttribute {
    /// The value bytes exactly as stored.
    pub fn raw<S: ByteSource + ?Sized>(&self, source: &S) -> Result<Bytes> {
        Ok(source.read(self.value)?)
    }

    /// The single DER element the value wraps.
    ///
    /// The enclosing OCTET STRING is already bounded, so a value that is
    /// empty, has a bad header, or carries bytes after its element is a
    /// coercion failure rather than a structural one.
    pub fn inner<S: ByteSource + ?Sized>(&self, source: &S) -> Result<Node> {
        if self.value.is_empty() {
            return Err(CoerceError::EncodingError("empty attribute value".into()).into());
        }
        let node = match decode_header(source, self.value.offset, self.value.end()) {
            Ok(node) => node,
            Err(DecodeError::Source(e)) => return Err(e.into()),
            Err(e) => {
                return Err(
                    CoerceError::EncodingError(format!("malformed attribute value: {}", e)).into(),
                )
            }
        };
        let end = node.content.end();
        if end != self.value.end() {
            return Err(CoerceError::EncodingError(format!(
                "{} bytes after the attribute value",
                self.value.end() - end
            ))
            .into());
        }
        Ok(node)
    }

    pub fn string<S: ByteSource + ?Sized>(&self, source: &S) -> Result<String> {
        let node = self.inner(source)?;
        Ok(Coercer::new(source).string(&node)?)
    }

    pub fn integer<S: ByteSource + ?Sized>(&self, source: &S) -> Result<i64> {
        let node = self.inner(source)?;
        Ok(Coercer::new(source).integer(&node)?)
    }

    pub fn date<S: ByteSource + ?Sized>(&self, source: &S) -> Result<DateTime<Utc>> {
        let node = self.inner(source)?;
        Ok(Coercer::new(source).date(&node)?)
    }

    pub fn flag<S: ByteSource + ?Sized>(&self, source: &S) -> Result<bool> {
        let node = self.inner(source)?;
        Ok(Coercer::new(source).flag(&node)?)
    }
}

/// Iterates the attributes of one attribute SET.
pub struct AttributeReader<'s, S: ByteSource + ?Sized> {
    source: &'s S,
    decoder: Decoder<'s, S>,
}

impl<'s, S: ByteSource + ?Sized> AttributeReader<'s, S> {
    /// Open the SET whose full encoding starts at `range.offset`.
    ///
    /// Bytes in `range` after the SET are not read.
    pub fn open(source: &'s S, range: ByteRange, limits: DecoderLimits) -> Result<Self> {
        let mut decoder = Decoder::with_range(source, range)?.limits(limits);
        decoder.expect_child(Tag::SET)?;
        Ok(Self { source, decoder })
    }

    /// The next attribute, `Ok(None)` at the end of the SET.
    ///
    /// Elements whose type or version is not a 64-bit integer are skipped.
    pub fn next_attribute(&mut self) -> Result<Option<ReceiptAttribute>> {
        loop {
            let Some(element) = self.decoder.next_child()? else {
                return Ok(None);
            };
            if element.tag != Tag::SEQUENCE {
                return Err(DecodeError::UnexpectedNode {
                    offset: element.header_offset,
                    expected: Tag::SEQUENCE,
                    found: element.tag,
                }
                .into());
            }

            let type_node = self.decoder.expect_child(Tag::INTEGER)?;
            let version_node = self.decoder.expect_child(Tag::INTEGER)?;
            let value_node = self.decoder.expect_child(Tag::OCTET_STRING)?;
            self.decoder.skip_to_end()?;

            let coercer = Coercer::new(self.source);
            let (type_code, version) = match (
                coercer.integer(&type_node),
                coercer.integer(&version_node),
            ) {
                (Ok(type_code), Ok(version)) => (type_code, version),
                (Err(CoerceError::Source(e)), _) | (_, Err(CoerceError::Source(e))) => {
                    return Err(e.into())
                }
                (Err(e), _) | (_, Err(e)) => {
                    debug!(
                        offset = element.header_offset,
                        error = %e,
                        "skipping attribute with undecodable type or version"
                    );
                    continue;
                }
            };

            return Ok(Some(ReceiptAttribute {
                type_code,
                version,
                value: value_node.content,
            }));
        }
    }
}

impl<'s, S: ByteSource + ?Sized> Iterator for AttributeReader<'s, S> {
    type Item = Result<ReceiptAttribute>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_attribute().transpose()
    }
}

/// Keep an optional field's value, or drop it if it fails to coerce.
///
/// Structural and source errors still propagate.
pub(crate) fn optional<T>(field: &'static str, result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_recoverable() => {
            debug!(field, error = %e, "ignoring undecodable optional field");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Like [`optional`], but keeps a recoverable failure for the caller to report.
pub(crate) fn required<T>(result: Result<T>) -> Result<std::result::Result<T, ReceiptError>> {
    match result {
        Ok(value) => Ok(Ok(value)),
        Err(e) if e.is_recoverable() => Ok(Err(e)),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iap_receipt_der::MemorySource;
    use iap_receipt_testkit::writer::{
        attribute, ia5_string, integer, octet_string, sequence, set, tlv, utf8_string,
    };

    fn read_all(bytes: Vec<u8>) -> (MemorySource, Vec<ReceiptAttribute>) {
        let source = MemorySource::new(bytes);
        let attributes = AttributeReader::open(&source, source.full_range(), DecoderLimits::default())
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap();
        (source, attributes)
    }

    #[test]
    fn test_field_codes_round_trip() {
        for field in [
            ReceiptField::BundleIdentifier,
            ReceiptField::OpaqueValue,
            ReceiptField::ReceiptHash,
            ReceiptField::CreationDate,
            ReceiptField::InAppPurchase,
            ReceiptField::OriginalApplicationVersion,
            ReceiptField::ExpirationDate,
        ] {
            assert_eq!(ReceiptField::from_code(field.code()), Some(field));
        }
        assert_eq!(PurchaseField::from_code(1712), Some(PurchaseField::CancellationDate));
        assert_eq!(PurchaseField::CancellationDate.code(), 1712);
        assert_eq!(ReceiptField::InAppPurchase as i64, 17);
        assert_eq!(PurchaseField::IsInIntroOfferPeriod as i64, 1719);
        assert_eq!(ReceiptField::from_code(2), None);
        assert_eq!(PurchaseField::from_code(1707), None);
    }

    #[test]
    fn test_reads_triples_in_order() {
        let bytes = set(&[
            attribute(3, 1, &utf8_string("com.example.app")),
            attribute(4, 2, &[0xde, 0xad]),
        ]);
        let (source, attributes) = read_all(bytes);

        assert_eq!(attributes.len(), 2);
        assert_eq!(attributes[0].type_code, 3);
        assert_eq!(attributes[0].version, 1);
        assert_eq!(attributes[0].string(&source).unwrap(), "com.example.app");
        assert_eq!(attributes[1].type_code, 4);
        assert_eq!(attributes[1].version, 2);
        assert_eq!(attributes[1].raw(&source).unwrap().as_ref(), &[0xde, 0xad]);
    }

    #[test]
    fn test_typed_accessors() {
        let bytes = set(&[
            attribute(1701, 1, &integer(3)),
            attribute(1704, 1, &ia5_string("2023-06-01T12:00:00Z")),
            attribute(1713, 1, &integer(1)),
        ]);
        let (source, attributes) = read_all(bytes);

        assert_eq!(attributes[0].integer(&source).unwrap(), 3);
        assert_eq!(
            attributes[1].date(&source).unwrap().to_rfc3339(),
            "2023-06-01T12:00:00+00:00"
        );
        assert!(attributes[2].flag(&source).unwrap());
    }

    #[test]
    fn test_extra_sequence_members_are_ignored() {
        let element = sequence(&[
            integer(3),
            integer(1),
            octet_string(&utf8_string("a")),
            integer(99),
        ]);
        let (_, attributes) = read_all(set(&[element, attribute(4, 1, b"x")]));
        let codes: Vec<i64> = attributes.iter().map(|a| a.type_code).collect();
        assert_eq!(codes, vec![3, 4]);
    }

    #[test]
    fn test_oversized_type_code_is_skipped() {
        let huge = tlv(Tag::INTEGER, &[0x01; 9]);
        let element = sequence(&[huge, integer(1), octet_string(b"x")]);
        let (_, attributes) = read_all(set(&[element, attribute(4, 1, b"y")]));
        assert_eq!(attributes.len(), 1);
        assert_eq!(attributes[0].type_code, 4);
    }

    #[test]
    fn test_non_sequence_element_is_structural() {
        let source = MemorySource::new(set(&[integer(3)]));
        let mut reader =
            AttributeReader::open(&source, source.full_range(), DecoderLimits::default()).unwrap();
        assert!(matches!(
            reader.next_attribute(),
            Err(ReceiptError::Decode(DecodeError::UnexpectedNode { .. }))
        ));
    }

    #[test]
    fn test_missing_value_is_structural() {
        let element = sequence(&[integer(3), integer(1)]);
        let source = MemorySource::new(set(&[element]));
        let mut reader =
            AttributeReader::open(&source, source.full_range(), DecoderLimits::default()).unwrap();
        assert!(matches!(
            reader.next_attribute(),
            Err(ReceiptError::Decode(DecodeError::UnexpectedEnd { .. }))
        ));
    }

    #[test]
    fn test_open_requires_set() {
        let source = MemorySource::new(sequence(&[]));
        let result = AttributeReader::open(&source, source.full_range(), DecoderLimits::default());
        assert!(matches!(
            result,
            Err(ReceiptError::Decode(DecodeError::UnexpectedNode { .. }))
        ));
    }

    #[test]
    fn test_inner_value_edge_cases() {
        let mut trailing = utf8_string("a");
        trailing.push(0x00);
        let bytes = set(&[
            attribute(3, 1, &[]),
            attribute(3, 1, &trailing),
            attribute(1712, 1, b"abc"),
            attribute(12, 1, &[0x16, 0x80]),
        ]);
        let (source, attributes) = read_all(bytes);

        for attribute in &attributes {
            let err = attribute.string(&source).unwrap_err();
            assert!(
                matches!(err, ReceiptError::Coerce(CoerceError::EncodingError(_))),
                "{:?}",
                err
            );
            assert!(err.is_recoverable());
        }
    }

    #[test]
    fn test_optional_swallows_only_coercion_failures() {
        let mismatch: Result<i64> = Err(CoerceError::FormatError("bad".into()).into());
        assert!(optional("quantity", mismatch).unwrap().is_none());

        let structural: Result<i64> = Err(DecodeError::MalformedTag { offset: 0 }.into());
        assert!(optional("quantity", structural).is_err());

        assert_eq!(optional("quantity", Ok(5)).unwrap(), Some(5));
    }
}
