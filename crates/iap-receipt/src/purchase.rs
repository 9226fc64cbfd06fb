//! In-app purchase records.

use chrono::{DateTime, Utc};
use iap_receipt_der::{decode_header, ByteRange, ByteSource, DecodeError, DecoderLimits, Tag};
use serde::Serialize;
use tracing::{debug, warn};

use crate::attribute::{optional, required, AttributeReader, PurchaseField};
use crate::error::{ReceiptError, Result};
use crate::types::ProductId;

/// One in-app purchase. Immutable once decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurchaseRecord {
    product_identifier: ProductId,
    transaction_id: String,
    original_transaction_id: Option<String>,
    purchase_date: DateTime<Utc>,
    original_purchase_date: Option<DateTime<Utc>>,
    subscription_expiration_date: Option<DateTime<Utc>>,
    cancellation_date: Option<DateTime<Utc>>,
    quantity: Option<i64>,
    web_order_line_item_id: Option<i64>,
    is_trial_period: Option<bool>,
    is_in_intro_offer_period: Option<bool>,
}

impl PurchaseRecord {
    /// Decode the purchase attribute SET at `range`.
    ///
    /// Returns `Ok(None)` when the value is not an attribute SET or a
    /// required field is missing or undecodable; the entry is skipped and the
    /// rest of the receipt still decodes. Structural errors inside the SET
    /// abort.
    pub fn parse<S: ByteSource + ?Sized>(
        source: &S,
        range: ByteRange,
        limits: DecoderLimits,
    ) -> Result<Option<Self>> {
        match decode_header(source, range.offset, range.end()) {
            Ok(node) if node.tag == Tag::SET => {}
            Ok(node) => {
                warn!(
                    offset = range.offset,
                    found = %node.tag,
                    "skipping purchase that is not an attribute set"
                );
                return Ok(None);
            }
            Err(DecodeError::Source(e)) => return Err(e.into()),
            Err(e) => {
                warn!(offset = range.offset, error = %e, "skipping purchase with malformed value");
                return Ok(None);
            }
        }

        let mut product_identifier = None;
        let mut transaction_id = None;
        let mut purchase_date = None;

        let mut original_transaction_id = None;
        let mut original_purchase_date = None;
        let mut subscription_expiration_date = None;
        let mut cancellation_date = None;
        let mut quantity = None;
        let mut web_order_line_item_id = None;
        let mut is_trial_period = None;
        let mut is_in_intro_offer_period = None;

        for attribute in AttributeReader::open(source, range, limits)? {
            let attribute = attribute?;
            let Some(field) = PurchaseField::from_code(attribute.type_code) else {
                debug!(
                    attribute_type = attribute.type_code,
                    version = attribute.version,
                    "skipping unknown purchase attribute"
                );
                continue;
            };
            let name = field.name();

            match field {
                PurchaseField::ProductIdentifier => {
                    let id = attribute.string(source).and_then(ProductId::new);
                    product_identifier = Some(required(id)?);
                }
                PurchaseField::TransactionIdentifier => {
                    transaction_id = Some(required(attribute.string(source))?);
                }
                PurchaseField::PurchaseDate => {
                    purchase_date = Some(required(attribute.date(source))?);
                }
                PurchaseField::OriginalTransactionIdentifier => {
                    original_transaction_id = optional(name, attribute.string(source))?;
                }
                PurchaseField::OriginalPurchaseDate => {
                    original_purchase_date = optional(name, attribute.date(source))?;
                }
                PurchaseField::SubscriptionExpirationDate => {
                    subscription_expiration_date = optional(name, attribute.date(source))?;
                }
                PurchaseField::CancellationDate => {
                    cancellation_date = optional(name, attribute.date(source))?;
                }
                PurchaseField::Quantity => {
                    quantity = optional(name, attribute.integer(source))?;
                }
                PurchaseField::WebOrderLineItemId => {
                    web_order_line_item_id = optional(name, attribute.integer(source))?;
                }
                PurchaseField::IsTrialPeriod => {
                    is_trial_period = optional(name, attribute.flag(source))?;
                }
                PurchaseField::IsInIntroOfferPeriod => {
                    is_in_intro_offer_period = optional(name, attribute.flag(source))?;
                }
            }
        }

        let (product_identifier, transaction_id, purchase_date) =
            match (product_identifier, transaction_id, purchase_date) {
                (Some(Ok(product)), Some(Ok(transaction)), Some(Ok(date))) => {
                    (product, transaction, date)
                }
                (product, transaction, date) => {
                    let reason = rejection(PurchaseField::ProductIdentifier, &product)
                        .or_else(|| rejection(PurchaseField::TransactionIdentifier, &transaction))
                        .or_else(|| rejection(PurchaseField::PurchaseDate, &date))
                        .unwrap_or_default();
                    warn!(offset = range.offset, %reason, "skipping purchase");
                    return Ok(None);
                }
            };

        Ok(Some(Self {
            product_identifier,
            transaction_id,
            original_transaction_id,
            purchase_date,
            original_purchase_date,
            subscription_expiration_date,
            cancellation_date,
            quantity,
            web_order_line_item_id,
            is_trial_period,
            is_in_intro_offer_period,
        }))
    }

    pub fn product_identifier(&self) -> &ProductId {
        &self.product_identifier
    }

    pub fn transaction_id(&self) -> &str {
        &self.transaction_id
    }

    pub fn original_transaction_id(&self) -> Option<&str> {
        self.original_transaction_id.as_deref()
    }

    pub fn purchase_date(&self) -> DateTime<Utc> {
        self.purchase_date
    }

    pub fn original_purchase_date(&self) -> Option<DateTime<Utc>> {
        self.original_purchase_date
    }

    pub fn subscription_expiration_date(&self) -> Option<DateTime<Utc>> {
        self.subscription_expiration_date
    }

    /// Set when the store refunded or revoked the purchase.
    pub fn cancellation_date(&self) -> Option<DateTime<Utc>> {
        self.cancellation_date
    }

    pub fn quantity(&self) -> Option<i64> {
        self.quantity
    }

    pub fn web_order_line_item_id(&self) -> Option<i64> {
        self.web_order_line_item_id
    }

    pub fn is_trial_period(&self) -> Option<bool> {
        self.is_trial_period
    }

    pub fn is_in_intro_offer_period(&self) -> Option<bool> {
        self.is_in_intro_offer_period
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation_date.is_some()
    }
}

fn rejection<T>(
    field: PurchaseField,
    value: &Option<std::result::Result<T, ReceiptError>>,
) -> Option<String> {
    match value {
        None => Some(format!("missing {}", field.name())),
        Some(Err(e)) => Some(format!("invalid {}: {}", field.name(), e)),
        Some(Ok(_)) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iap_receipt_der::MemorySource;
    use iap_receipt_testkit::fixtures::PurchaseFixture;
    use iap_receipt_testkit::writer::{attribute, ia5_string, integer, set, tlv, utf8_string};

    fn parse(bytes: Vec<u8>) -> Result<Option<PurchaseRecord>> {
        let source = MemorySource::new(bytes);
        PurchaseRecord::parse(&source, source.full_range(), DecoderLimits::default())
    }

    fn date(text: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(text).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_required_fields() {
        let fixture = PurchaseFixture::new("com.example.app.monthly", "1000000001", "2023-06-01T12:00:00Z");
        let record = parse(fixture.encode()).unwrap().unwrap();

        assert_eq!(record.product_identifier.as_str(), "com.example.app.monthly");
        assert_eq!(record.transaction_id, "1000000001");
        assert_eq!(record.purchase_date, date("2023-06-01T12:00:00Z"));
        assert_eq!(record.quantity, Some(1));
        assert_eq!(record.subscription_expiration_date, None);
        assert_eq!(record.cancellation_date, None);
        assert!(!record.is_cancelled());
    }

    #[test]
    fn test_optional_fields() {
        let fixture = PurchaseFixture::new("p", "2", "2023-01-01T00:00:00Z")
            .original_transaction_id("1")
            .expires("2024-01-01T00:00:00Z")
            .cancelled("2023-06-01T00:00:00Z")
            .trial(true)
            .extra_attribute(1706, ia5_string("2022-12-31T23:59:59Z"))
            .extra_attribute(1711, integer(1_000_000_123))
            .extra_attribute(1719, integer(0));
        let record = parse(fixture.encode()).unwrap().unwrap();

        assert_eq!(record.original_transaction_id.as_deref(), Some("1"));
        assert_eq!(record.subscription_expiration_date, Some(date("2024-01-01T00:00:00Z")));
        assert_eq!(record.cancellation_date, Some(date("2023-06-01T00:00:00Z")));
        assert_eq!(record.original_purchase_date, Some(date("2022-12-31T23:59:59Z")));
        assert_eq!(record.web_order_line_item_id, Some(1_000_000_123));
        assert_eq!(record.is_trial_period, Some(true));
        assert_eq!(record.is_in_intro_offer_period, Some(false));
        assert!(record.is_cancelled());
    }

    #[test]
    fn test_unknown_attributes_ignored() {
        let plain = PurchaseFixture::new("p", "1", "2023-01-01T00:00:00Z");
        let extended = plain
            .clone()
            .extra_attribute(9999, utf8_string("future"))
            .extra_attribute(-5, vec![0xff, 0x00]);

        assert_eq!(parse(plain.encode()).unwrap(), parse(extended.encode()).unwrap());
    }

    #[test]
    fn test_missing_required_field_skips_purchase() {
        let fixture = PurchaseFixture::new("p", "1", "2023-01-01T00:00:00Z").without_purchase_date();
        assert_eq!(parse(fixture.encode()).unwrap(), None);

        let fixture =
            PurchaseFixture::new("p", "1", "2023-01-01T00:00:00Z").without_product_identifier();
        assert_eq!(parse(fixture.encode()).unwrap(), None);
    }

    #[test]
    fn test_undecodable_required_field_skips_purchase() {
        let bytes = set(&[
            attribute(1702, 1, &utf8_string("p")),
            attribute(1703, 1, &utf8_string("1")),
            attribute(1704, 1, &ia5_string("yesterday")),
        ]);
        assert_eq!(parse(bytes).unwrap(), None);

        let bytes = set(&[
            attribute(1702, 1, &utf8_string("")),
            attribute(1703, 1, &utf8_string("1")),
            attribute(1704, 1, &ia5_string("2023-01-01T00:00:00Z")),
        ]);
        assert_eq!(parse(bytes).unwrap(), None);
    }

    #[test]
    fn test_undecodable_optional_field_is_absent() {
        let fixture = PurchaseFixture::new("p", "1", "2023-01-01T00:00:00Z")
            .cancelled("")
            .extra_attribute(1701, utf8_string("one"));
        let record = parse(fixture.encode()).unwrap().unwrap();
        assert_eq!(record.cancellation_date, None);
        assert_eq!(record.quantity, None);
    }

    #[test]
    fn test_fallback_date_format() {
        let fixture = PurchaseFixture::new("p", "1", "2023-03-15 08:30:00 Etc/GMT");
        let record = parse(fixture.encode()).unwrap().unwrap();
        assert_eq!(record.purchase_date, date("2023-03-15T08:30:00Z"));
    }

    #[test]
    fn test_broken_element_inside_set_aborts() {
        // SEQUENCE claims five content bytes, the SET holds three.
        let bytes = tlv(Tag::SET, &[0x30, 0x05, 0x02, 0x01, 0x03]);
        assert!(matches!(
            parse(bytes),
            Err(ReceiptError::Decode(DecodeError::TruncatedData { .. }))
        ));
    }

    #[test]
    fn test_value_that_is_not_a_set_skips_purchase() {
        assert_eq!(parse(utf8_string("not a purchase set")).unwrap(), None);
        assert_eq!(parse(Vec::new()).unwrap(), None);

        let mut cut = PurchaseFixture::new("p", "1", "2023-01-01T00:00:00Z").encode();
        cut.truncate(cut.len() - 3);
        assert_eq!(parse(cut).unwrap(), None);
    }

    #[test]
    fn test_garbage_optional_value_is_absent() {
        let fixture = PurchaseFixture::new("p", "1", "2023-01-01T00:00:00Z")
            .extra_attribute(1712, b"abc".to_vec())
            .extra_attribute(1708, vec![0x16, 0x80]);
        let record = parse(fixture.encode()).unwrap().unwrap();
        assert_eq!(record.cancellation_date(), None);
        assert_eq!(record.subscription_expiration_date(), None);
        assert_eq!(record.transaction_id(), "1");
    }

    #[test]
    fn test_serializes_dates_as_rfc3339() {
        let fixture = PurchaseFixture::new("p", "1", "2023-01-01T00:00:00Z");
        let record = parse(fixture.encode()).unwrap().unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["product_identifier"], "p");
        assert_eq!(json["purchase_date"], "2023-01-01T00:00:00Z");
        assert!(json["cancellation_date"].is_null());
    }
}
