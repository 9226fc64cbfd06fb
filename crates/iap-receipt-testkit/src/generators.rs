//! Proptest generators for property-based testing.

use chrono::{DateTime, SecondsFormat};
use proptest::prelude::*;

use crate::fixtures::{PurchaseFixture, ReceiptFixture};

/// Reverse-DNS style identifier, e.g. `com.example.app`.
pub fn bundle_identifier() -> impl Strategy<Value = String> {
    "[a-z]{2,6}(\\.[a-z][a-z0-9]{1,8}){1,3}".prop_map(String::from)
}

/// A product identifier under a fixed app prefix.
pub fn product_identifier() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,15}".prop_map(|suffix| format!("com.example.{}", suffix))
}

/// Numeric transaction identifier.
pub fn transaction_id() -> impl Strategy<Value = String> {
    (1_000_000_000u64..10_000_000_000u64).prop_map(|n| n.to_string())
}

/// Unix seconds between 2008 and 2038.
pub fn timestamp() -> impl Strategy<Value = i64> {
    1_199_145_600i64..2_145_916_800i64
}

/// An RFC 3339 date string such as `2023-06-01T12:00:00Z`.
pub fn rfc3339_date() -> impl Strategy<Value = String> {
    timestamp().prop_map(format_rfc3339)
}

/// Format unix seconds as RFC 3339 with a `Z` suffix.
pub fn format_rfc3339(secs: i64) -> String {
    DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default()
}

/// Opaque value bytes.
pub fn opaque_value() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=64)
}

/// Device identifier bytes (UUID-sized).
pub fn device_identifier() -> impl Strategy<Value = Vec<u8>> {
    any::<[u8; 16]>().prop_map(|bytes| bytes.to_vec())
}

/// An attribute type code that no receipt level assigns.
pub fn unknown_type_code() -> impl Strategy<Value = i64> {
    prop_oneof![
        30_000i64..1_000_000i64,
        (-1_000i64..0i64),
        Just(i64::MAX),
    ]
}

/// A purchase with required fields and optional dates.
pub fn purchase_fixture() -> impl Strategy<Value = PurchaseFixture> {
    (
        product_identifier(),
        transaction_id(),
        timestamp(),
        proptest::option::of(timestamp()),
        proptest::option::of(timestamp()),
    )
        .prop_map(|(product, transaction, purchased, expires, cancelled)| {
            let mut fixture =
                PurchaseFixture::new(&product, &transaction, &format_rfc3339(purchased));
            if let Some(expires) = expires {
                fixture = fixture.expires(&format_rfc3339(expires));
            }
            if let Some(cancelled) = cancelled {
                fixture = fixture.cancelled(&format_rfc3339(cancelled));
            }
            fixture
        })
}

impl Arbitrary for ReceiptFixture {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            bundle_identifier(),
            opaque_value(),
            device_identifier(),
            prop::collection::vec(purchase_fixture(), 0..6),
        )
            .prop_map(|(bundle, opaque, device, purchases)| {
                let mut fixture = ReceiptFixture::new(&bundle)
                    .opaque_value(&opaque)
                    .device_identifier(&device);
                for purchase in purchases {
                    fixture = fixture.purchase(purchase);
                }
                fixture
            })
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iap_receipt_der::{decode_all, DecoderLimits, MemorySource};

    #[test]
    fn test_format_rfc3339() {
        assert_eq!(format_rfc3339(1_685_620_800), "2023-06-01T12:00:00Z");
    }

    proptest! {
        #[test]
        fn test_generated_payloads_are_well_formed(fixture: ReceiptFixture) {
            let source = MemorySource::new(fixture.encode_payload());
            prop_assert!(decode_all(&source, DecoderLimits::default()).is_ok());
        }

        #[test]
        fn test_generated_payloads_are_deterministic(fixture: ReceiptFixture) {
            prop_assert_eq!(fixture.encode_payload(), fixture.encode_payload());
        }
    }
}
