//! Golden receipt vectors.
//!
//! Every decoder of this format must recover the same fields from these
//! hand-assembled blobs, and the stored hashes must verify against the
//! golden device identifier.

use chrono::{DateTime, Utc};
use iap_receipt::{AppReceipt, DeviceIdentifier, ReceiptConfig};
use iap_receipt_testkit::vectors::{
    all_vectors, device_identifier, FULL_PAYLOAD_HEX, FULL_PKCS7_HEX, MINIMAL_PAYLOAD_HEX,
};

fn decode_hex(hex_blob: &str) -> AppReceipt {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let bytes = hex::decode(hex_blob).unwrap();
    AppReceipt::from_bytes(bytes, &ReceiptConfig::default()).unwrap()
}

fn device() -> DeviceIdentifier {
    DeviceIdentifier::from_bytes(device_identifier())
}

fn date(text: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(text).unwrap().with_timezone(&Utc)
}

#[test]
fn test_all_vectors() {
    for vector in all_vectors() {
        let receipt = decode_hex(vector.hex);

        assert_eq!(receipt.bundle_identifier(), vector.bundle_identifier, "{}", vector.name);
        assert_eq!(receipt.receipt_hash().to_hex(), vector.hash_hex, "{}", vector.name);
        assert_eq!(receipt.purchase_count(), vector.purchase_count, "{}", vector.name);
        assert_eq!(
            receipt.product_identifiers().count(),
            vector.product_count,
            "{}",
            vector.name
        );
        assert!(receipt.verify_receipt_hash(&device()), "{}", vector.name);
    }
}

#[test]
fn test_minimal_bundle_identifier_data() {
    let receipt = decode_hex(MINIMAL_PAYLOAD_HEX);

    let mut expected = vec![0x0c, 0x0f];
    expected.extend_from_slice(b"com.example.app");
    assert_eq!(receipt.bundle_identifier_data(), expected.as_slice());
    assert_eq!(receipt.opaque_value(), (0x10u8..0x20).collect::<Vec<_>>().as_slice());
    assert_eq!(receipt.creation_date(), None);
}

#[test]
fn test_minimal_rejects_other_device() {
    let receipt = decode_hex(MINIMAL_PAYLOAD_HEX);
    let other = DeviceIdentifier::parse_uuid("00000000-0000-0000-0000-000000000000").unwrap();
    assert!(!receipt.verify_receipt_hash(&other));
}

#[test]
fn test_full_bare_and_wrapped_agree() {
    assert_eq!(decode_hex(FULL_PAYLOAD_HEX), decode_hex(FULL_PKCS7_HEX));
}

#[test]
fn test_full_identity_fields() {
    let receipt = decode_hex(FULL_PKCS7_HEX);

    assert_eq!(receipt.bundle_identifier(), "com.example.pro");
    assert_eq!(hex::encode(receipt.opaque_value()), "a1b2c3d4e5f60718");
    assert_eq!(receipt.creation_date(), Some(date("2024-02-01T10:00:00Z")));
    assert_eq!(receipt.original_application_version(), None);
    assert_eq!(receipt.expiration_date(), None);
}

#[test]
fn test_full_purchases() {
    let receipt = decode_hex(FULL_PKCS7_HEX);

    let products: Vec<&str> = receipt.product_identifiers().map(|p| p.as_str()).collect();
    assert_eq!(products, vec!["com.example.pro.lifetime", "com.example.pro.monthly"]);

    let monthly = receipt.purchases_for("com.example.pro.monthly");
    assert_eq!(monthly.len(), 2);
    assert_eq!(monthly[0].transaction_id(), "1000000001");
    assert_eq!(monthly[0].purchase_date(), date("2023-01-01T00:00:00Z"));
    assert_eq!(monthly[0].subscription_expiration_date(), Some(date("2024-01-01T00:00:00Z")));
    // Empty cancellation date string decodes as absent.
    assert_eq!(monthly[0].cancellation_date(), None);
    assert_eq!(monthly[1].transaction_id(), "1000000002");
    assert_eq!(monthly[1].quantity(), Some(1));

    let lifetime = receipt.purchases_for("com.example.pro.lifetime");
    assert_eq!(lifetime.len(), 1);
    assert_eq!(lifetime[0].transaction_id(), "1000000003");
    assert_eq!(lifetime[0].purchase_date(), date("2023-03-15T08:30:00Z"));
    assert_eq!(lifetime[0].subscription_expiration_date(), None);
}

#[test]
fn test_full_expiration() {
    let receipt = decode_hex(FULL_PKCS7_HEX);
    assert_eq!(
        receipt.expiration_date_for_product("com.example.pro.monthly"),
        Some(date("2025-01-01T00:00:00Z"))
    );
    assert_eq!(receipt.expiration_date_for_product("com.example.pro.lifetime"), None);
}

#[test]
fn test_full_json_shape() {
    let receipt = decode_hex(FULL_PKCS7_HEX);
    let json = serde_json::to_value(&receipt).unwrap();

    assert_eq!(json["receipt_hash"], "b8333da8ffc7bd6a2aa1fec60ca587a43d13db6e");
    assert_eq!(json["opaque_value"], "a1b2c3d4e5f60718");
    assert_eq!(
        json["purchases"]["com.example.pro.monthly"][1]["subscription_expiration_date"],
        "2025-01-01T00:00:00Z"
    );
}
