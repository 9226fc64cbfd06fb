//! # IAP Receipt Testkit
//!
//! Testing utilities for the receipt decoder.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Writer**: A minimal DER encoder, used only to build test inputs
//! - **Fixtures**: Receipt and purchase builders with correct hashes
//! - **Generators**: Proptest strategies for property-based testing
//! - **Golden vectors**: Fixed DER blobs with known decodes
//!
//! ## Fixtures
//!
//! ```rust
//! use iap_receipt_testkit::fixtures::{PurchaseFixture, ReceiptFixture};
//!
//! let bytes = ReceiptFixture::new("com.example.app")
//!     .purchase(
//!         PurchaseFixture::new("com.example.app.monthly", "1000000001", "2023-06-01T12:00:00Z")
//!             .expires("2023-07-01T12:00:00Z"),
//!     )
//!     .encode_pkcs7();
//! assert!(!bytes.is_empty());
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use iap_receipt_testkit::ReceiptFixture;
//!
//! proptest! {
//!     #[test]
//!     fn payload_is_deterministic(fixture: ReceiptFixture) {
//!         prop_assert_eq!(fixture.encode_payload(), fixture.encode_payload());
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;
pub mod writer;

pub use fixtures::{detached_pkcs7, wrap_pkcs7, PurchaseFixture, ReceiptFixture, DEVICE_IDENTIFIER};
pub use vectors::{all_vectors, GoldenVector};
